//! Resend transactional email client

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::MailError;

pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";

/// Outgoing message for `POST /emails`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailRequest {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Clone)]
pub struct ResendClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl ResendClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, MailError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MailError::Configuration(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another host (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a message, returning the id Resend assigned to it
    pub async fn send_email(&self, request: &EmailRequest) -> Result<String, MailError> {
        if request.to.is_empty() {
            return Err(MailError::InvalidMessage("no recipients".to_string()));
        }

        let response = self
            .http_client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = MailError::from_response(response).await;
            tracing::warn!(error = %err, "resend rejected email");
            return Err(err);
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| MailError::Decode(e.to_string()))?;

        tracing::info!(id = %sent.id, recipients = request.to.len(), "email sent via resend");
        Ok(sent.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_missing_bodies() {
        let request = EmailRequest {
            from: "bot@example.com".to_string(),
            to: vec!["ada@example.com".to_string()],
            subject: "Hi".to_string(),
            html: Some("<p>Hi</p>".to_string()),
            text: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["html"], "<p>Hi</p>");
        assert!(json.get("text").is_none());
    }

    #[tokio::test]
    async fn test_send_requires_recipient() {
        let client = ResendClient::new("re_key").unwrap();
        let request = EmailRequest {
            from: "bot@example.com".to_string(),
            to: vec![],
            subject: "Hi".to_string(),
            html: None,
            text: Some("Hi".to_string()),
        };

        assert!(matches!(
            client.send_email(&request).await,
            Err(MailError::InvalidMessage(_))
        ));
    }
}
