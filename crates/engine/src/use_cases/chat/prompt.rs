//! System prompt built from live game context.

use crate::infrastructure::ports::{EnginePort, GamePort};

const PERSONA: &str = "You are a witty chess bot on Lichess.";
const BREVITY: &str = "Keep your answers very short (max 2 sentences). \
Be slightly arrogant if you are winning, but helpful if the user asks for advice.";

/// Shown in place of the score when the engine has no stat at the configured index.
pub const UNKNOWN_SCORE: &str = "unknown";

/// Builds the per-request system prompt.
///
/// Engines differ in which stat line carries the evaluation, so the index is
/// configurable rather than fixed.
#[derive(Debug, Clone, Copy)]
pub struct SystemPromptBuilder {
    score_stat_index: usize,
}

impl SystemPromptBuilder {
    pub fn new(score_stat_index: usize) -> Self {
        Self { score_stat_index }
    }

    pub fn score(&self, engine: &dyn EnginePort) -> String {
        engine
            .stats()
            .into_iter()
            .nth(self.score_stat_index)
            .filter(|stat| !stat.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SCORE.to_string())
    }

    pub fn build(&self, game: &dyn GamePort, engine: &dyn EnginePort) -> String {
        let side = game.side_to_move();
        let to_move = if side == game.my_color() {
            "It is your move".to_string()
        } else {
            format!("It is {side} to move")
        };

        format!(
            "{PERSONA} You are playing {color}. {to_move}. The current game evaluation is {score}. {BREVITY}",
            color = game.my_color(),
            score = self.score(engine),
        )
    }
}

impl Default for SystemPromptBuilder {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use chatbridge_domain::Color;

    use super::*;
    use crate::infrastructure::ports::{MockEnginePort, MockGamePort};

    fn game(my_color: Color, side_to_move: Color) -> MockGamePort {
        let mut game = MockGamePort::new();
        game.expect_my_color().return_const(my_color);
        game.expect_side_to_move().return_const(side_to_move);
        game
    }

    fn engine(stats: &[&str]) -> MockEnginePort {
        let stats: Vec<String> = stats.iter().map(|s| s.to_string()).collect();
        let mut engine = MockEnginePort::new();
        engine.expect_stats().returning(move || stats.clone());
        engine
    }

    #[test]
    fn prompt_carries_color_turn_and_score() {
        let prompt = SystemPromptBuilder::new(0).build(
            &game(Color::White, Color::White),
            &engine(&["Evaluation: +1.20", "Depth: 18"]),
        );

        assert!(prompt.starts_with("You are a witty chess bot on Lichess."));
        assert!(prompt.contains("You are playing white."));
        assert!(prompt.contains("It is your move."));
        assert!(prompt.contains("The current game evaluation is Evaluation: +1.20."));
        assert!(prompt.contains("max 2 sentences"));
    }

    #[test]
    fn opponent_to_move_is_named() {
        let prompt = SystemPromptBuilder::new(0)
            .build(&game(Color::Black, Color::White), &engine(&["+0.3"]));
        assert!(prompt.contains("It is white to move."));
    }

    #[test]
    fn score_index_is_configurable() {
        let builder = SystemPromptBuilder::new(1);
        assert_eq!(builder.score(&engine(&["Depth: 18", "Score: -0.5"])), "Score: -0.5");
    }

    #[test]
    fn missing_score_is_unknown() {
        let builder = SystemPromptBuilder::new(2);
        assert_eq!(builder.score(&engine(&["only one"])), UNKNOWN_SCORE);
        assert_eq!(SystemPromptBuilder::default().score(&engine(&[])), UNKNOWN_SCORE);
    }
}
