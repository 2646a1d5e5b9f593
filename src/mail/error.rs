//! Error types for the mail adapters

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    /// The HTTP client could not be built
    #[error("Client configuration error: {0}")]
    Configuration(String),

    /// Non-success status from the mail API
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// Transport failure before a status was received
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response or message content could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Caller supplied an unusable message
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl MailError {
    /// Drain a failed response into an `HttpError`
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        MailError::HttpError { status, body }
    }
}
