//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Completion backends (remote OpenAI-compatible server or in-process generator)
//! - Backend probing
//! - Chat delivery (the hosting transport)
//! - The game, engine, and challenge queue supplying chat context
//! - Randomness (for testing)

mod error;
mod external;
mod game;
mod testing;

pub use error::{LlmError, TransportError};
pub use external::{
    BackendKind, ChatTransport, CompletionPort, CompletionRequest, CompletionSettings, ProbePort,
    ProbeResult, DEFAULT_MODEL_PLACEHOLDER,
};
pub use game::{ChallengeQueuePort, EnginePort, GamePort};
pub use testing::RandomPort;

#[cfg(test)]
pub use external::{MockChatTransport, MockCompletionPort, MockProbePort};
#[cfg(test)]
pub use game::{MockChallengeQueuePort, MockEnginePort, MockGamePort};
#[cfg(test)]
pub use testing::MockRandomPort;
