//! Ollama backend implementation
//!
//! Talks to two endpoints:
//! - `GET /api/tags` as a liveness probe
//! - `POST /api/generate` with `stream: false`; only `response` is read back

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parsing::truncate;
use super::types::{BackendHealth, GenerationOptions};
use super::{InferenceBackend, InferenceError};
use crate::prompts::PromptPair;

/// Longest raw body kept in error messages
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    health_timeout: Duration,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str, health_timeout: Duration) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            health_timeout,
        }
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: &'a GenerationOptions,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

fn classify_transport_error(err: reqwest::Error) -> InferenceError {
    if err.is_timeout() {
        InferenceError::Timeout
    } else {
        InferenceError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn health_check(&self) -> BackendHealth {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => BackendHealth::Ready,
            Ok(resp) => {
                debug!("Ollama health check returned {}", resp.status());
                BackendHealth::Unavailable
            }
            Err(e) => {
                debug!("Ollama health check failed: {}", e);
                BackendHealth::Unavailable
            }
        }
    }

    async fn generate(
        &self,
        prompt: &PromptPair,
        options: &GenerationOptions,
        timeout: Duration,
    ) -> Result<String, InferenceError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt: &prompt.user,
            system: &prompt.system,
            stream: false,
            options,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        // The body read is covered by the same per-request timeout
        let body = response.text().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            return Err(InferenceError::Rejected {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let ollama_response: OllamaResponse = serde_json::from_str(&body).map_err(|e| {
            InferenceError::MalformedBody(format!(
                "{} | Raw: {}",
                e,
                truncate(&body, MAX_ERROR_BODY_CHARS)
            ))
        })?;
        debug!("Ollama response: {}", ollama_response.response);

        Ok(ollama_response.response.trim().to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
