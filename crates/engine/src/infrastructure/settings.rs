//! Chat bridge settings.
//!
//! Loaded from `AI_CHAT_*` environment variables (after `.env` files have been
//! applied by the binary). Every option has a default, so an empty environment
//! yields a usable configuration pointing at a local Ollama server.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{CompletionSettings, DEFAULT_MODEL_PLACEHOLDER};
use crate::infrastructure::probe::MAX_PROBE_TIMEOUT;
use crate::infrastructure::remote_http::DEFAULT_BASE_URL;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Invalid settings: {0}")]
    Validation(String),
}

impl SettingsError {
    fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Whether free-text chat is answered by the language model at all.
    pub enabled: bool,
    /// Base URL of the OpenAI-compatible completion server.
    pub url: String,
    /// Model to request when the probe does not report one.
    pub model: Option<String>,
    pub timeout_seconds: u64,
    pub max_history_messages: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Capped at five seconds.
    pub probe_timeout_seconds: u64,
    /// Which engine stat line carries the evaluation score.
    pub score_stat_index: usize,
    pub command_prefix: char,
    /// Answer with the in-process generator when the server is unreachable.
    pub local_fallback: bool,
    /// Consecutive 502/503/504 responses before the backend is marked disconnected.
    pub server_error_threshold: u32,
    /// Minimum time between probes of a disconnected session.
    pub reprobe_cooldown_seconds: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_BASE_URL.to_string(),
            model: None,
            timeout_seconds: 10,
            max_history_messages: 6,
            max_tokens: 50,
            temperature: 0.7,
            probe_timeout_seconds: 5,
            score_stat_index: 0,
            command_prefix: '!',
            local_fallback: false,
            server_error_threshold: 1,
            reprobe_cooldown_seconds: 30,
        }
    }
}

impl ChatSettings {
    /// Create settings from environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup, starting from the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = get("AI_CHAT_ENABLED") {
            settings.enabled = parse_bool("AI_CHAT_ENABLED", &value)?;
        }
        if let Some(value) = get("AI_CHAT_URL") {
            settings.url = value;
        }
        if let Some(value) = get("AI_CHAT_MODEL") {
            settings.model = Some(value);
        }
        if let Some(value) = get("AI_CHAT_TIMEOUT_SECONDS") {
            settings.timeout_seconds = parse_num("AI_CHAT_TIMEOUT_SECONDS", &value)?;
        }
        if let Some(value) = get("AI_CHAT_MAX_HISTORY_MESSAGES") {
            settings.max_history_messages = parse_num("AI_CHAT_MAX_HISTORY_MESSAGES", &value)?;
        }
        if let Some(value) = get("AI_CHAT_MAX_TOKENS") {
            settings.max_tokens = parse_num("AI_CHAT_MAX_TOKENS", &value)?;
        }
        if let Some(value) = get("AI_CHAT_TEMPERATURE") {
            settings.temperature = parse_num("AI_CHAT_TEMPERATURE", &value)?;
        }
        if let Some(value) = get("AI_CHAT_PROBE_TIMEOUT_SECONDS") {
            settings.probe_timeout_seconds = parse_num("AI_CHAT_PROBE_TIMEOUT_SECONDS", &value)?;
        }
        if let Some(value) = get("AI_CHAT_SCORE_STAT_INDEX") {
            settings.score_stat_index = parse_num("AI_CHAT_SCORE_STAT_INDEX", &value)?;
        }
        if let Some(value) = get("AI_CHAT_COMMAND_PREFIX") {
            let mut chars = value.chars();
            settings.command_prefix = match (chars.next(), chars.next()) {
                (Some(prefix), None) => prefix,
                _ => {
                    return Err(SettingsError::invalid(
                        "AI_CHAT_COMMAND_PREFIX",
                        &value,
                        "expected a single character",
                    ))
                }
            };
        }
        if let Some(value) = get("AI_CHAT_LOCAL_FALLBACK") {
            settings.local_fallback = parse_bool("AI_CHAT_LOCAL_FALLBACK", &value)?;
        }
        if let Some(value) = get("AI_CHAT_SERVER_ERROR_THRESHOLD") {
            settings.server_error_threshold =
                parse_num("AI_CHAT_SERVER_ERROR_THRESHOLD", &value)?;
        }

        if let Some(value) = get("AI_CHAT_REPROBE_COOLDOWN_SECONDS") {
            settings.reprobe_cooldown_seconds =
                parse_num("AI_CHAT_REPROBE_COOLDOWN_SECONDS", &value)?;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.url.trim().is_empty() {
            return Err(SettingsError::Validation("url cannot be empty".to_string()));
        }
        if self.timeout_seconds == 0 {
            return Err(SettingsError::Validation(
                "timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.max_history_messages == 0 {
            return Err(SettingsError::Validation(
                "max_history_messages must be at least 1".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(SettingsError::Validation(
                "max_tokens must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(SettingsError::Validation(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.server_error_threshold == 0 {
            return Err(SettingsError::Validation(
                "server_error_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn reprobe_cooldown(&self) -> Duration {
        Duration::from_secs(self.reprobe_cooldown_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds).min(MAX_PROBE_TIMEOUT)
    }

    /// Per-request settings. The probed model wins over the configured one.
    pub fn completion_settings(&self, probed_model: Option<String>) -> CompletionSettings {
        let model = probed_model
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL_PLACEHOLDER.to_string());

        CompletionSettings {
            model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: self.request_timeout(),
        }
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::invalid(key, value, "expected a boolean")),
    }
}

fn parse_num<T>(key: &'static str, value: &str) -> Result<T, SettingsError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| SettingsError::invalid(key, value, e))
}
