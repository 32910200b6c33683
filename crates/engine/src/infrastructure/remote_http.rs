//! Remote completion backend (OpenAI-compatible API)
//!
//! Works against any server exposing `POST /v1/chat/completions`: Ollama,
//! llama.cpp server, vLLM and friends.

use async_trait::async_trait;
use chatbridge_domain::Turn;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{BackendKind, CompletionPort, CompletionRequest, LlmError};

/// Default base URL of a local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Client for an OpenAI-compatible chat completion server
#[derive(Clone)]
pub struct RemoteHttpBackend {
    client: Client,
    base_url: String,
}

impl RemoteHttpBackend {
    /// The request timeout comes from each request's settings, so the client
    /// itself carries none.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CompletionPort for RemoteHttpBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::RemoteHttp
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let settings = request.settings;
        let api_request = ChatCompletionRequest {
            model: settings.model,
            messages: build_messages(&request.messages),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .timeout(settings.timeout)
            .json(&api_request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), error_text));
        }

        let body = response.text().await.map_err(classify)?;
        let api_response: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        first_content(api_response)
    }
}

pub(crate) fn classify(error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Transport(error.to_string())
    }
}

fn build_messages(turns: &[Turn]) -> Vec<ApiMessage> {
    turns
        .iter()
        .map(|turn| ApiMessage {
            role: turn.role.as_str().to_string(),
            content: Some(turn.content.clone()),
        })
        .collect()
}

fn first_content(response: ChatCompletionResponse) -> Result<String, LlmError> {
    if response.choices.is_empty() {
        return Err(LlmError::MalformedResponse(
            "No choices in LLM response".to_string(),
        ));
    }

    response
        .choices
        .into_iter()
        .find_map(|choice| choice.message.and_then(|m| m.content))
        .ok_or_else(|| LlmError::MalformedResponse("No message content in choices".to_string()))
}

// =============================================================================
// OpenAI API types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: Option<ApiMessage>,
}
