//! HTTP client for the Ollama API.
//!
//! Each operation is exactly one outbound request bounded by a timeout:
//! - POST /api/pull
//! - POST /api/generate
//! - GET /api/version (liveness / readiness probe)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::BackendConfig;
use crate::relay::{Backend, PullOutcome, RelayError};

/// Bound for [`Backend::ping`].
const PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    stream: bool,
    model: &'a str,
}

#[derive(Debug, Serialize)]
struct PullBody<'a> {
    name: &'a str,
    stream: bool,
}

/// The only part of a generate reply we keep.
#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: String,
}

/// Ollama API client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    request_timeout: Duration,
    pull_timeout: Duration,
}

impl OllamaClient {
    /// Build a client from resolved configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(RelayError::Transport)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.generate_model.clone(),
            request_timeout: config.request_timeout(),
            pull_timeout: config.pull_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /api/version` bounded by `timeout`; any 2xx counts as alive.
    pub async fn probe(&self, timeout: Duration) -> Result<(), RelayError> {
        let response = self
            .http
            .get(self.endpoint("/api/version"))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| RelayError::from_reqwest(e, timeout))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RelayError::Status { status, body })
        }
    }
}

#[async_trait]
impl Backend for OllamaClient {
    async fn pull(&self, model: &str) -> Result<PullOutcome, RelayError> {
        info!(model, "Pulling model");

        let timeout = self.pull_timeout;
        let response = self
            .http
            .post(self.endpoint("/api/pull"))
            .json(&PullBody {
                name: model,
                stream: false,
            })
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                let err = RelayError::from_reqwest(e, timeout);
                error!(model, error = %err, "Error pulling model");
                err
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .map_err(|e| RelayError::from_reqwest(e, timeout))?;
            error!(model, %status, body = %body, "Failed to pull model");
            return Err(RelayError::Status { status, body });
        }

        info!(model, "Model downloaded");
        Ok(PullOutcome::for_model(model))
    }

    async fn generate(&self, prompt: &str) -> Result<String, RelayError> {
        info!(model = %self.model, prompt_len = prompt.len(), "Generating response");
        debug!(prompt, "Prompt text");

        let timeout = self.request_timeout;
        let result = async {
            let response = self
                .http
                .post(self.endpoint("/api/generate"))
                .json(&GenerateBody {
                    prompt,
                    stream: false,
                    model: &self.model,
                })
                .timeout(timeout)
                .send()
                .await?;

            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        }
        .await;

        let (status, bytes) = result.map_err(|e| {
            let err = RelayError::from_reqwest(e, timeout);
            error!(error = %err, "Error during prompt generation");
            err
        })?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            error!(%status, body = %body, "Backing server rejected generate request");
            return Err(RelayError::Status { status, body });
        }

        match serde_json::from_slice::<GenerateReply>(&bytes) {
            Ok(reply) => {
                debug!(response_len = reply.response.len(), "Generation complete");
                Ok(reply.response)
            }
            Err(e) => {
                error!(error = %e, "Generate reply has no usable \"response\" field");
                Err(RelayError::MalformedResponse)
            }
        }
    }

    async fn ping(&self) -> Result<(), RelayError> {
        self.probe(PING_TIMEOUT).await
    }
}
