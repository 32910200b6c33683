//! External service port traits (completion backends, probing, chat delivery).

use std::time::Duration;

use async_trait::async_trait;
use chatbridge_domain::Turn;

use super::error::{LlmError, TransportError};

// =============================================================================
// Completion Types
// =============================================================================

/// Placeholder model name used when neither the probe nor the settings name one.
pub const DEFAULT_MODEL_PLACEHOLDER: &str = "default";

/// Per-request generation settings, resolved before the call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Upper bound on the whole request
    pub timeout: Duration,
}

/// A completion call: system turn first, then the stored history.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Turn>,
    pub settings: CompletionSettings,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Turn>, settings: CompletionSettings) -> Self {
        Self { messages, settings }
    }
}

/// Which kind of backend serves completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    RemoteHttp,
    InProcess,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::RemoteHttp => write!(f, "remote-http"),
            BackendKind::InProcess => write!(f, "in-process"),
        }
    }
}

/// A completion backend. Implementations report every failure as an
/// [`LlmError`]; they never panic on transport or parse problems.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionPort: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Generate the next assistant message. The returned text is untrimmed.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

// =============================================================================
// Probe
// =============================================================================

/// Outcome of a reachability check against a completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeResult {
    pub reachable: bool,
    /// First model the backend reported, if it listed any.
    pub model_id: Option<String>,
}

impl ProbeResult {
    pub fn reachable(model_id: Option<String>) -> Self {
        Self {
            reachable: true,
            model_id,
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }
}

/// Reachability/capability check. Every failure resolves to a result value.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProbePort: Send + Sync {
    fn endpoint(&self) -> String;

    async fn probe(&self) -> ProbeResult;
}

// =============================================================================
// Chat Transport
// =============================================================================

/// Delivery of chat messages to a game's chat rooms.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, game_id: &str, room: &str, text: &str) -> Result<(), TransportError>;
}
