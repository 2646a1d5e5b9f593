//! Error types for the LLM layer

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling a model provider
#[derive(Debug, Error)]
pub enum LlmError {
    /// The HTTP client could not be built
    #[error("Client configuration error: {0}")]
    Configuration(String),

    /// Non-success status or transport failure
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// 429 from the provider
    #[error("Rate limit exceeded (retry after {retry_after:?})")]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Broken or undecodable event stream
    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Error reported inside the stream or a blocked prompt
    #[error("Provider error ({code}): {message}")]
    ProviderError { code: String, message: String },

    /// The stream finished without any text
    #[error("{provider} returned no content")]
    EmptyResponse { provider: String },
}

impl LlmError {
    /// Build the error for a non-success response
    pub fn from_status(status: reqwest::StatusCode, retry_after: Option<&str>, body: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return LlmError::RateLimitExceeded {
                retry_after: retry_after
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs),
            };
        }

        LlmError::HttpError {
            status: status.as_u16(),
            body,
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::HttpError {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_rate_limit() {
        let err = LlmError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, Some("30"), String::new());
        match err {
            LlmError::RateLimitExceeded { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(30)))
            }
            other => panic!("Expected RateLimitExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_from_status_other() {
        let err = LlmError::from_status(
            reqwest::StatusCode::UNAUTHORIZED,
            None,
            "invalid x-api-key".to_string(),
        );
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid x-api-key"));
    }

    #[test]
    fn test_empty_response_names_provider() {
        let err = LlmError::EmptyResponse {
            provider: "gemini".to_string(),
        };
        assert_eq!(err.to_string(), "gemini returned no content");
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let llm_err: LlmError = json_err.into();
        assert!(matches!(llm_err, LlmError::SerializationError(_)));
    }
}
