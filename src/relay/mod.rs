//! Request relay to the backing Ollama server.
//!
//! - [`client`]: reqwest-based [`Backend`] implementation
//! - [`error`]: failure taxonomy shared by all relay calls

pub mod client;
pub mod error;

use async_trait::async_trait;
use serde::Serialize;

pub use client::OllamaClient;
pub use error::RelayError;

/// Result of a successful pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullOutcome {
    pub message: String,
}

impl PullOutcome {
    pub fn for_model(model: &str) -> Self {
        Self {
            message: format!("Model {model} downloaded successfully"),
        }
    }
}

/// One backing-server call per operation. No retries.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Ask the backing server to fetch `model`.
    async fn pull(&self, model: &str) -> Result<PullOutcome, RelayError>;

    /// Generate a whole (non-streamed) completion for `prompt`.
    /// Returns the backing server's `response` field unmodified.
    async fn generate(&self, prompt: &str) -> Result<String, RelayError>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), RelayError>;
}
