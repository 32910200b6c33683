//! Liveness state of a completion backend.
//!
//! One `BackendState` exists per configured endpoint and is shared by every
//! chat session talking to it. Probing marks it connected; overload responses
//! from the backend mark it disconnected once `server_error_threshold`
//! consecutive overloads have been seen. Nothing here re-probes on its own.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::RwLock;

pub struct BackendState {
    enabled: bool,
    endpoint: String,
    connected: AtomicBool,
    model_id: RwLock<Option<String>>,
    server_error_threshold: u32,
    /// Consecutive overload responses (reset by any success)
    consecutive_server_errors: AtomicU32,
    /// Number of times the backend was marked disconnected (for metrics)
    disconnect_count: AtomicU64,
}

/// Point-in-time copy of a [`BackendState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSnapshot {
    pub enabled: bool,
    pub connected: bool,
    pub endpoint: String,
    pub model_id: Option<String>,
    pub consecutive_server_errors: u32,
    pub disconnect_count: u64,
}

impl BackendState {
    pub fn new(endpoint: impl Into<String>, enabled: bool, server_error_threshold: u32) -> Self {
        Self {
            enabled,
            endpoint: endpoint.into(),
            connected: AtomicBool::new(false),
            model_id: RwLock::new(None),
            server_error_threshold: server_error_threshold.max(1),
            consecutive_server_errors: AtomicU32::new(0),
            disconnect_count: AtomicU64::new(0),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn model_id(&self) -> Option<String> {
        match self.model_id.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Record a successful probe.
    pub fn mark_connected(&self, model_id: Option<String>) {
        match self.model_id.write() {
            Ok(mut guard) => *guard = model_id,
            Err(poisoned) => *poisoned.into_inner() = model_id,
        }
        self.consecutive_server_errors.store(0, Ordering::Relaxed);
        let was_connected = self.connected.swap(true, Ordering::AcqRel);
        if !was_connected {
            tracing::info!(endpoint = %self.endpoint, "Completion backend marked connected");
        }
    }

    pub fn mark_disconnected(&self) {
        let was_connected = self.connected.swap(false, Ordering::AcqRel);
        if was_connected {
            self.disconnect_count.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(endpoint = %self.endpoint, "Completion backend marked disconnected");
        }
    }

    pub fn record_success(&self) {
        self.consecutive_server_errors.store(0, Ordering::Relaxed);
    }

    /// Record an overload response (502/503/504). Returns whether this flipped
    /// the backend to disconnected.
    pub fn record_server_error(&self) -> bool {
        let failures = self.consecutive_server_errors.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.server_error_threshold && self.is_connected() {
            tracing::warn!(
                endpoint = %self.endpoint,
                consecutive_server_errors = failures,
                threshold = self.server_error_threshold,
                "Completion backend overloaded"
            );
            self.mark_disconnected();
            true
        } else {
            false
        }
    }

    pub fn snapshot(&self) -> BackendSnapshot {
        BackendSnapshot {
            enabled: self.enabled,
            connected: self.is_connected(),
            endpoint: self.endpoint.clone(),
            model_id: self.model_id(),
            consecutive_server_errors: self.consecutive_server_errors.load(Ordering::Relaxed),
            disconnect_count: self.disconnect_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected() {
        let state = BackendState::new("http://localhost:11434", true, 1);
        assert!(!state.is_connected());
        assert_eq!(state.model_id(), None);
    }

    #[test]
    fn probe_success_connects_and_records_model() {
        let state = BackendState::new("http://localhost:11434", true, 1);
        state.mark_connected(Some("m1".to_string()));

        let snapshot = state.snapshot();
        assert!(snapshot.connected);
        assert_eq!(snapshot.model_id.as_deref(), Some("m1"));
    }

    #[test]
    fn single_overload_disconnects_with_default_threshold() {
        let state = BackendState::new("http://localhost:11434", true, 1);
        state.mark_connected(None);

        assert!(state.record_server_error());
        assert!(!state.is_connected());
        assert_eq!(state.snapshot().disconnect_count, 1);
    }

    #[test]
    fn threshold_counts_consecutive_overloads_only() {
        let state = BackendState::new("http://localhost:11434", true, 3);
        state.mark_connected(None);

        assert!(!state.record_server_error());
        assert!(!state.record_server_error());
        state.record_success();
        assert!(!state.record_server_error());
        assert!(!state.record_server_error());
        assert!(state.is_connected());

        assert!(state.record_server_error());
        assert!(!state.is_connected());
    }

    #[test]
    fn reconnect_after_fresh_probe() {
        let state = BackendState::new("http://localhost:11434", true, 1);
        state.mark_connected(Some("m1".to_string()));
        state.record_server_error();
        assert!(!state.is_connected());

        state.mark_connected(Some("m2".to_string()));
        assert!(state.is_connected());
        assert_eq!(state.model_id().as_deref(), Some("m2"));
        assert_eq!(state.snapshot().consecutive_server_errors, 0);
    }

    #[test]
    fn zero_threshold_is_treated_as_one() {
        let state = BackendState::new("in-process", true, 0);
        state.mark_connected(None);
        assert!(state.record_server_error());
    }
}
