//! Error types for port operations.

/// Failures reported by a completion backend.
///
/// None of these reach a chat user: the completion boundary logs them and
/// turns them into the empty-reply failure signal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    /// Connection refused, DNS failure, broken body stream.
    #[error("LLM request failed: {0}")]
    Transport(String),

    #[error("LLM request timed out")]
    Timeout,

    /// 502/503/504 from the backend.
    #[error("LLM server overloaded (HTTP {status})")]
    ServerOverloaded { status: u16 },

    /// Any other non-200 status.
    #[error("LLM request rejected (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    /// JSON parse failure or a body without a usable choice.
    #[error("Invalid response: {0}")]
    MalformedResponse(String),

    /// The in-process generator failed.
    #[error("Local generation failed: {0}")]
    Generator(String),
}

impl LlmError {
    /// Map a non-200 HTTP status to the matching error.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            502..=504 => Self::ServerOverloaded { status },
            _ => Self::Status {
                status,
                body: body.into(),
            },
        }
    }

    pub fn is_server_overloaded(&self) -> bool {
        matches!(self, Self::ServerOverloaded { .. })
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerOverloaded { status } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors from delivering a message to the chat transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Chat delivery failed: {0}")]
    Delivery(String),
    #[error("Chat transport closed")]
    Closed,
}
