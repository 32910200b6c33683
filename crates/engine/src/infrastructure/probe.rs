//! Backend probe
//!
//! Asks the completion endpoint which models it serves. When the model listing
//! fails in any way, falls back to a plain reachability check of the endpoint
//! root. Never reports an error to its caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode};
use serde::Deserialize;

use crate::infrastructure::ports::{LlmError, ProbePort, ProbeResult};
use crate::infrastructure::remote_http::classify;

/// Probes never wait longer than this.
pub const MAX_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpBackendProbe {
    client: Client,
    endpoint: String,
}

impl HttpBackendProbe {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        // Redirects stay visible so a redirecting root still counts as alive.
        let client = Client::builder()
            .timeout(timeout.min(MAX_PROBE_TIMEOUT))
            .redirect(redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    async fn list_models(&self) -> Result<Option<String>, LlmError> {
        let response = self
            .client
            .get(format!("{}/v1/models", self.endpoint))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LlmError::from_status(status.as_u16(), ""));
        }

        let body = response.text().await.map_err(classify)?;
        let models: ModelList =
            serde_json::from_str(&body).map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        Ok(models.data.into_iter().next().map(|model| model.id))
    }

    async fn root_reachable(&self) -> bool {
        match self.client.get(format!("{}/", self.endpoint)).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || status.is_redirection() {
                    true
                } else {
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        status = status.as_u16(),
                        "Completion backend root check returned an error status"
                    );
                    false
                }
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %classify(e),
                    "Completion backend is unreachable"
                );
                false
            }
        }
    }
}

#[async_trait]
impl ProbePort for HttpBackendProbe {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn probe(&self) -> ProbeResult {
        match self.list_models().await {
            Ok(model_id) => {
                tracing::info!(
                    endpoint = %self.endpoint,
                    model = model_id.as_deref().unwrap_or("<none listed>"),
                    "Completion backend connected"
                );
                return ProbeResult::reachable(model_id);
            }
            Err(e) => {
                tracing::debug!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Model listing failed, checking endpoint root"
                );
            }
        }

        if self.root_reachable().await {
            tracing::info!(
                endpoint = %self.endpoint,
                "Completion backend reachable, model unknown"
            );
            ProbeResult::reachable(None)
        } else {
            ProbeResult::unreachable()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::infrastructure::test_support::{spawn_backend, unused_base_url};

    fn probe_for(base_url: &str) -> HttpBackendProbe {
        HttpBackendProbe::new(base_url, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn listed_model_is_reported() {
        let router = Router::new().route(
            "/v1/models",
            get(|| async { Json(json!({"data": [{"id": "m1"}, {"id": "m2"}]})) }),
        );
        let base_url = spawn_backend(router).await;

        let result = probe_for(&base_url).probe().await;
        assert_eq!(result, ProbeResult::reachable(Some("m1".to_string())));
    }

    #[tokio::test]
    async fn empty_model_list_is_reachable_without_model() {
        let router = Router::new().route("/v1/models", get(|| async { Json(json!({"data": []})) }));
        let base_url = spawn_backend(router).await;

        let result = probe_for(&base_url).probe().await;
        assert_eq!(result, ProbeResult::reachable(None));
    }

    #[tokio::test]
    async fn missing_models_route_falls_back_to_root() {
        let router = Router::new().route("/", get(|| async { "Ollama is running" }));
        let base_url = spawn_backend(router).await;

        let result = probe_for(&base_url).probe().await;
        assert_eq!(result, ProbeResult::reachable(None));
    }

    #[tokio::test]
    async fn malformed_listing_with_redirecting_root_is_reachable() {
        let router = Router::new()
            .route("/v1/models", get(|| async { "<html>not json</html>" }))
            .route(
                "/",
                get(|| async { (HttpStatus::FOUND, [("location", "/ui")], "") }),
            );
        let base_url = spawn_backend(router).await;

        let result = probe_for(&base_url).probe().await;
        assert_eq!(result, ProbeResult::reachable(None));
    }

    #[tokio::test]
    async fn failing_root_is_unreachable() {
        let router = Router::new()
            .route("/v1/models", get(|| async { HttpStatus::SERVICE_UNAVAILABLE }))
            .route("/", get(|| async { HttpStatus::INTERNAL_SERVER_ERROR }));
        let base_url = spawn_backend(router).await;

        let result = probe_for(&base_url).probe().await;
        assert_eq!(result, ProbeResult::unreachable());
    }

    #[tokio::test]
    async fn connection_errors_are_unreachable() {
        let probe = probe_for(&unused_base_url());
        let result = probe.probe().await;
        assert!(!result.reachable);
        assert_eq!(result.model_id, None);
    }

    #[test]
    fn endpoint_is_normalized() {
        let probe = HttpBackendProbe::new("http://localhost:11434/", Duration::from_secs(30));
        assert_eq!(probe.endpoint(), "http://localhost:11434");
    }
}
