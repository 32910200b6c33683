//! Ports onto the game being played: the game itself, the engine playing it,
//! and the account's pending challenges.

use std::time::Duration;

use chatbridge_domain::Color;

#[cfg_attr(test, mockall::automock)]
pub trait GamePort: Send + Sync {
    fn id(&self) -> String;
    fn url(&self) -> String;
    /// Account name of the bot in this game.
    fn username(&self) -> String;
    /// Name shown for the bot (may differ from the account name in casing).
    fn display_name(&self) -> String;
    fn my_color(&self) -> Color;
    fn side_to_move(&self) -> Color;
    /// Whether the game can still be aborted (no moves played yet).
    fn is_abortable(&self) -> bool;
    fn extend_abort_timer(&self, wait: Duration);
}

#[cfg_attr(test, mockall::automock)]
pub trait EnginePort: Send + Sync {
    fn name(&self) -> String;
    /// Display strings for chat, e.g. `["Evaluation: +0.35", "Depth: 18"]`.
    fn stats(&self) -> Vec<String>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ChallengeQueuePort: Send + Sync {
    /// Challenger names, oldest first.
    fn challengers(&self) -> Vec<String>;
}
