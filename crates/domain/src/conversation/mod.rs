//! Conversation history types.

mod transcript;
mod turn;

pub use transcript::Transcript;
pub use turn::{Role, Turn};
