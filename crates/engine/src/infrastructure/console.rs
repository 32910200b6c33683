//! Console adapters for running the bridge from a terminal.
//!
//! Lines typed on stdin stand in for chat events, replies are printed on
//! stdout, and the game/engine context is fixed at startup.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use chatbridge_domain::{ChatLine, Color, PLAYER_ROOM};

use crate::infrastructure::ports::{
    ChallengeQueuePort, ChatTransport, EnginePort, GamePort, TransportError,
};

/// Username assumed for console lines that do not name a speaker.
pub const DEFAULT_SPEAKER: &str = "opponent";

/// Parse `[room] user: text`, `user: text`, or plain text spoken by
/// [`DEFAULT_SPEAKER`] in the player room.
pub fn parse_console_line(input: &str) -> ChatLine {
    let input = input.trim();
    let (room, rest) = match input.strip_prefix('[').and_then(|s| s.split_once(']')) {
        Some((room, rest)) if !room.trim().is_empty() => (room.trim(), rest.trim_start()),
        _ => (PLAYER_ROOM, input),
    };

    match rest.split_once(": ") {
        Some((user, text)) if !user.is_empty() && !user.contains(char::is_whitespace) => {
            ChatLine::new(room, user, text)
        }
        _ => ChatLine::new(room, DEFAULT_SPEAKER, rest),
    }
}

/// Prints outgoing chat to stdout.
pub struct StdoutTransport;

#[async_trait]
impl ChatTransport for StdoutTransport {
    async fn send(&self, game_id: &str, room: &str, text: &str) -> Result<(), TransportError> {
        let mut out = std::io::stdout();
        writeln!(out, "<{game_id}> [{room}] {text}")
            .and_then(|_| out.flush())
            .map_err(|e| TransportError::Delivery(e.to_string()))
    }
}

pub struct ConsoleGame {
    id: String,
    username: String,
    color: Color,
}

impl ConsoleGame {
    pub fn new(id: impl Into<String>, username: impl Into<String>, color: Color) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            color,
        }
    }
}

impl GamePort for ConsoleGame {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn url(&self) -> String {
        format!("https://lichess.org/{}", self.id)
    }

    fn username(&self) -> String {
        self.username.clone()
    }

    fn display_name(&self) -> String {
        self.username.clone()
    }

    fn my_color(&self) -> Color {
        self.color
    }

    fn side_to_move(&self) -> Color {
        self.color
    }

    // No moves are ever played on the console.
    fn is_abortable(&self) -> bool {
        true
    }

    fn extend_abort_timer(&self, wait: Duration) {
        tracing::info!(game_id = %self.id, wait_secs = wait.as_secs(), "Abort timer extended");
    }
}

pub struct StaticEngine {
    name: String,
    stats: Vec<String>,
}

impl StaticEngine {
    pub fn new(name: impl Into<String>, stats: Vec<String>) -> Self {
        Self {
            name: name.into(),
            stats,
        }
    }
}

impl EnginePort for StaticEngine {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn stats(&self) -> Vec<String> {
        self.stats.clone()
    }
}

#[derive(Default)]
pub struct StaticChallenges(pub Vec<String>);

impl ChallengeQueuePort for StaticChallenges {
    fn challengers(&self) -> Vec<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use chatbridge_domain::SPECTATOR_ROOM;

    use super::*;

    #[test]
    fn plain_text_is_the_opponent_in_player_room() {
        let line = parse_console_line("good luck!");
        assert_eq!(line, ChatLine::new(PLAYER_ROOM, DEFAULT_SPEAKER, "good luck!"));
    }

    #[test]
    fn room_and_user_are_parsed() {
        let line = parse_console_line("[spectator] kibitzer: !eval");
        assert_eq!(line, ChatLine::new(SPECTATOR_ROOM, "kibitzer", "!eval"));
    }

    #[test]
    fn user_without_room_defaults_to_player_room() {
        let line = parse_console_line("magnus: nice move");
        assert_eq!(line, ChatLine::new(PLAYER_ROOM, "magnus", "nice move"));
    }

    #[test]
    fn sentence_with_colon_is_not_a_username() {
        let line = parse_console_line("note this: I resign");
        assert_eq!(line.username, DEFAULT_SPEAKER);
        assert_eq!(line.text, "note this: I resign");
    }

    #[test]
    fn console_game_reports_its_context() {
        let game = ConsoleGame::new("abcd1234", "WittyBot", Color::White);
        assert_eq!(game.username(), "WittyBot");
        assert_eq!(game.my_color(), Color::White);
        assert_eq!(game.url(), "https://lichess.org/abcd1234");
        assert!(game.is_abortable());
    }
}
