//! Chatbridge domain types.
//!
//! Pure value types and invariants for bridging a game chat channel to a
//! language-model backend. Nothing here performs I/O.

pub mod chat;
pub mod conversation;
pub mod error;
pub mod game;

pub use chat::{
    sanitize_reply, ChatCommand, ChatInput, ChatLine, ELLIPSIS, MAX_CHAT_CHARS, PLAYER_ROOM,
    SPECTATOR_ROOM,
};
pub use conversation::{Role, Transcript, Turn};
pub use error::DomainError;
pub use game::Color;
