//! Inbound chat events.

use serde::{Deserialize, Serialize};

/// Room where the players of a game talk.
pub const PLAYER_ROOM: &str = "player";
/// Room where spectators of a game talk.
pub const SPECTATOR_ROOM: &str = "spectator";

/// A single message received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    /// Whether the message was sent in the player room or the spectator room.
    pub room: String,
    /// The account that sent the message.
    pub username: String,
    /// The message text.
    pub text: String,
}

impl ChatLine {
    pub fn new(
        room: impl Into<String>,
        username: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            room: room.into(),
            username: username.into(),
            text: text.into(),
        }
    }

    pub fn is_spectator_room(&self) -> bool {
        self.room == SPECTATOR_ROOM
    }

    pub fn is_from(&self, username: &str) -> bool {
        self.username == username
    }
}
