//! Failure kinds of a single relay call.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    /// The backing server could not be reached or the exchange broke off.
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    /// The backing server answered with a failure status.
    #[error("backing server responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The backing server answered 2xx but without the expected field.
    #[error("Malformed response from Ollama")]
    MalformedResponse,

    /// No complete answer within the configured bound.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl RelayError {
    /// Classify a reqwest failure, separating timeouts from other transport errors.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            RelayError::Timeout(timeout)
        } else {
            RelayError::Transport(err)
        }
    }

    /// Short label used as the `outcome` metric dimension.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::Transport(_) => "transport_error",
            RelayError::Status { .. } => "status_error",
            RelayError::MalformedResponse => "malformed",
            RelayError::Timeout(_) => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_carries_body() {
        let err = RelayError::Status {
            status: StatusCode::NOT_FOUND,
            body: "model 'nope' not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("model 'nope' not found"));
        assert_eq!(err.outcome(), "status_error");
    }

    #[test]
    fn test_malformed_message_is_fixed() {
        assert_eq!(
            RelayError::MalformedResponse.to_string(),
            "Malformed response from Ollama"
        );
    }
}
