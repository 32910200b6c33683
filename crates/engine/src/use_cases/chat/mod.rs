//! Game chat: commands, free-text replies and the language model session.

pub mod conversation;
pub mod prompt;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use conversation::{Action, Conversation};
pub use prompt::SystemPromptBuilder;
pub use session::{
    BackendCatalog, ChatSession, PendingReply, SessionState, DISCONNECTED_REPLY,
    GENERATION_FAILED_REPLY,
};
