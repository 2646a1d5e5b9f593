//! Claude client implementation

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;

use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{GenerateRequest, ProviderKind, StreamEvent, UsageMetadata},
};
use crate::logging::preview;

use super::mapper::{from_claude_event, to_claude_request};
use super::sse::parse_sse_stream;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude model identifiers for the Anthropic API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaudeModel {
    Haiku3,
    Sonnet4,
    Sonnet45,
    Haiku45,
    /// Any other model id, passed through unchanged
    Custom(String),
}

impl ClaudeModel {
    pub fn as_str(&self) -> &str {
        match self {
            ClaudeModel::Haiku3 => "claude-3-haiku-20240307",
            ClaudeModel::Sonnet4 => "claude-sonnet-4-20250514",
            ClaudeModel::Sonnet45 => "claude-sonnet-4-5-20250929",
            ClaudeModel::Haiku45 => "claude-haiku-4-5-20251001",
            ClaudeModel::Custom(id) => id,
        }
    }

    pub fn from_id(id: &str) -> Self {
        match id {
            "claude-3-haiku-20240307" => ClaudeModel::Haiku3,
            "claude-sonnet-4-20250514" => ClaudeModel::Sonnet4,
            "claude-sonnet-4-5-20250929" => ClaudeModel::Sonnet45,
            "claude-haiku-4-5-20251001" => ClaudeModel::Haiku45,
            other => ClaudeModel::Custom(other.to_string()),
        }
    }
}

/// Client for the Anthropic Messages API
pub struct ClaudeClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: ClaudeModel,
}

impl ClaudeClient {
    /// Create a client authenticating with `api_key`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, model: ClaudeModel) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    /// Point the client at another host (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &ClaudeModel {
        &self.model
    }

    fn endpoint_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    async fn make_streaming_request(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        if let Some(first) = request.messages.first() {
            tracing::debug!(model = self.model.as_str(), prompt = %preview(&first.text), "claude request");
        }

        let body = to_claude_request(self.model.as_str(), request);

        let response = self
            .http_client
            .post(self.endpoint_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "claude request failed");
            return Err(LlmError::from_status(status, retry_after.as_deref(), body));
        }

        let sse_stream = parse_sse_stream(Box::pin(response.bytes_stream()));

        let mut usage = UsageMetadata::default();
        let event_stream = sse_stream.flat_map(move |result| {
            let events: Vec<Result<StreamEvent, LlmError>> = match result {
                Ok(event) => from_claude_event(event, &mut usage).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            futures::stream::iter(events)
        });

        Ok(Box::pin(event_stream))
    }
}

#[async_trait]
impl LlmProvider for ClaudeClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        self.make_streaming_request(request).await
    }
}
