//! Completion client boundary
//!
//! Wraps any [`CompletionPort`] so that callers only ever see a reply string:
//! the trimmed completion on success, an empty string on any failure. The
//! failure cause goes to the log, and overload responses feed the shared
//! [`BackendState`].

use std::sync::Arc;

use chatbridge_domain::Turn;

use crate::infrastructure::backend_state::BackendState;
use crate::infrastructure::ports::{
    BackendKind, CompletionPort, CompletionRequest, CompletionSettings,
};

#[derive(Clone)]
pub struct CompletionClient {
    backend: Arc<dyn CompletionPort>,
    state: Arc<BackendState>,
}

impl CompletionClient {
    pub fn new(backend: Arc<dyn CompletionPort>, state: Arc<BackendState>) -> Self {
        Self { backend, state }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn state(&self) -> &Arc<BackendState> {
        &self.state
    }

    /// Returns the trimmed reply, or an empty string when generation failed.
    pub async fn complete(&self, messages: Vec<Turn>, settings: CompletionSettings) -> String {
        let kind = self.backend.kind();
        let model = settings.model.clone();
        let message_count = messages.len();

        match self
            .backend
            .complete(CompletionRequest::new(messages, settings))
            .await
        {
            Ok(text) => {
                self.state.record_success();
                let reply = text.trim();
                if reply.is_empty() {
                    tracing::warn!(
                        backend = %kind,
                        model = %model,
                        "Completion returned no text"
                    );
                } else {
                    tracing::debug!(
                        backend = %kind,
                        model = %model,
                        messages = message_count,
                        reply_chars = reply.chars().count(),
                        "Completion succeeded"
                    );
                }
                reply.to_string()
            }
            Err(e) => {
                if e.is_server_overloaded() {
                    self.state.record_server_error();
                }
                tracing::error!(
                    backend = %kind,
                    endpoint = %self.state.endpoint(),
                    model = %model,
                    status = ?e.status(),
                    error = %e,
                    "Completion request failed"
                );
                String::new()
            }
        }
    }
}
