//! Gmail REST client acting on behalf of a user's OAuth access token

use std::time::Duration;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use super::error::MailError;

pub const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com";

/// Gmail pads some payloads and not others
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const UNREAD_LABEL: &str = "UNREAD";

/// A message as read from a mailbox
#[derive(Debug, Clone, PartialEq)]
pub struct GmailMessage {
    pub id: String,
    pub thread_id: Option<String>,
    pub subject: Option<String>,
    pub from: String,
    pub to: Vec<String>,
    pub body: Option<String>,
    pub html_body: Option<String>,
    pub labels: Vec<String>,
    pub is_read: bool,
}

// Wire types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    id: String,
    thread_id: Option<String>,
    #[serde(default)]
    label_ids: Vec<String>,
    payload: Option<MessagePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Clone)]
pub struct GmailClient {
    http_client: Client,
    base_url: String,
}

impl GmailClient {
    pub fn new() -> Result<Self, MailError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MailError::Configuration(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another host (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/gmail/v1/users/me/messages", self.base_url)
    }

    /// Fetch the newest `max_results` messages with full content.
    ///
    /// Messages that fail to load individually are logged and skipped.
    pub async fn list_messages(
        &self,
        access_token: &str,
        max_results: u32,
    ) -> Result<Vec<GmailMessage>, MailError> {
        let response = self
            .http_client
            .get(self.messages_url())
            .bearer_auth(access_token)
            .query(&[("maxResults", max_results)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::from_response(response).await);
        }

        let listing: ListMessagesResponse = response
            .json()
            .await
            .map_err(|e| MailError::Decode(e.to_string()))?;

        let mut messages = Vec::with_capacity(listing.messages.len());
        for message_ref in listing.messages {
            match self.get_message(access_token, &message_ref.id).await {
                Ok(message) => messages.push(message),
                Err(e) => {
                    tracing::warn!(message_id = %message_ref.id, error = %e, "skipping gmail message")
                }
            }
        }

        Ok(messages)
    }

    pub async fn get_message(&self, access_token: &str, id: &str) -> Result<GmailMessage, MailError> {
        let response = self
            .http_client
            .get(format!("{}/{}", self.messages_url(), id))
            .bearer_auth(access_token)
            .query(&[("format", "full")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::from_response(response).await);
        }

        let raw: RawMessage = response
            .json()
            .await
            .map_err(|e| MailError::Decode(e.to_string()))?;

        Ok(convert_message(raw))
    }

    /// Send a plain-text message from the token owner's mailbox, returning its id
    pub async fn send_message(
        &self,
        access_token: &str,
        to: &[String],
        subject: &str,
        body: &str,
    ) -> Result<String, MailError> {
        let raw = build_raw_message(to, subject, body)?;

        let response = self
            .http_client
            .post(format!("{}/send", self.messages_url()))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::from_response(response).await);
        }

        let sent: SentMessage = response
            .json()
            .await
            .map_err(|e| MailError::Decode(e.to_string()))?;
        Ok(sent.id)
    }

    /// Remove the UNREAD label
    pub async fn mark_as_read(&self, access_token: &str, id: &str) -> Result<(), MailError> {
        let response = self
            .http_client
            .post(format!("{}/{}/modify", self.messages_url(), id))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "removeLabelIds": [UNREAD_LABEL] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::from_response(response).await);
        }

        Ok(())
    }
}

fn convert_message(raw: RawMessage) -> GmailMessage {
    let payload = raw.payload.unwrap_or_default();

    let header = |name: &str| {
        payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone())
    };

    let to = header("To")
        .map(|value| {
            value
                .split(',')
                .map(|addr| addr.trim().to_string())
                .filter(|addr| !addr.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut body = None;
    let mut html_body = None;
    collect_bodies(&payload, &mut body, &mut html_body);

    GmailMessage {
        is_read: !raw.label_ids.iter().any(|l| l == UNREAD_LABEL),
        id: raw.id,
        thread_id: raw.thread_id,
        subject: header("Subject"),
        from: header("From").unwrap_or_default(),
        to,
        body,
        html_body,
        labels: raw.label_ids,
    }
}

/// Depth-first search for the first plain and first HTML body
fn collect_bodies(part: &MessagePart, body: &mut Option<String>, html: &mut Option<String>) {
    if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
        if let Some(text) = decode_body(data) {
            match part.mime_type.as_str() {
                "text/html" if html.is_none() => *html = Some(text),
                "text/html" => {}
                _ if body.is_none() => *body = Some(text),
                _ => {}
            }
        }
    }

    for child in &part.parts {
        collect_bodies(child, body, html);
    }
}

fn decode_body(data: &str) -> Option<String> {
    let bytes = URL_SAFE_LENIENT.decode(data.trim()).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// RFC 822 message, base64url encoded
fn build_raw_message(to: &[String], subject: &str, body: &str) -> Result<String, MailError> {
    if to.is_empty() {
        return Err(MailError::InvalidMessage("no recipients".to_string()));
    }

    let has_line_break = |s: &str| s.contains('\r') || s.contains('\n');
    if has_line_break(subject) || to.iter().any(|addr| has_line_break(addr)) {
        return Err(MailError::InvalidMessage(
            "header values must not contain line breaks".to_string(),
        ));
    }

    let message = format!(
        "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{}",
        to.join(", "),
        subject,
        body
    );

    Ok(URL_SAFE.encode(message))
}
