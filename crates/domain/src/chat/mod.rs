//! Chat vocabulary: inbound lines, command classification, outbound shaping.

mod command;
mod line;
mod sanitize;

pub use command::{ChatCommand, ChatInput};
pub use line::{ChatLine, PLAYER_ROOM, SPECTATOR_ROOM};
pub use sanitize::{sanitize_reply, ELLIPSIS, MAX_CHAT_CHARS};
