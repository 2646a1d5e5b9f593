//! Gemini client implementation

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use uuid::Uuid;

use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{GenerateRequest, ProviderKind, StreamEvent},
};
use crate::logging::preview;

use super::mapper::{create_message_start, from_gemini_response, to_gemini_request};
use super::sse::parse_sse_stream;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini model identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiModel {
    Gemini15Flash,
    Gemini15Pro,
    Gemini25Pro,
    Gemini25Flash,
    Gemini25FlashLite,
    /// Any other model id, passed through unchanged
    Custom(String),
}

impl GeminiModel {
    pub fn as_str(&self) -> &str {
        match self {
            GeminiModel::Gemini15Flash => "gemini-1.5-flash",
            GeminiModel::Gemini15Pro => "gemini-1.5-pro",
            GeminiModel::Gemini25Pro => "gemini-2.5-pro",
            GeminiModel::Gemini25Flash => "gemini-2.5-flash",
            GeminiModel::Gemini25FlashLite => "gemini-2.5-flash-lite",
            GeminiModel::Custom(id) => id,
        }
    }

    pub fn from_id(id: &str) -> Self {
        match id {
            "gemini-1.5-flash" => GeminiModel::Gemini15Flash,
            "gemini-1.5-pro" => GeminiModel::Gemini15Pro,
            "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
            "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
            "gemini-2.5-flash-lite" => GeminiModel::Gemini25FlashLite,
            other => GeminiModel::Custom(other.to_string()),
        }
    }
}

/// Client for the Generative Language API
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: GeminiModel,
}

impl GeminiClient {
    /// Create a client authenticating with `api_key`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, model: GeminiModel) -> Result<Self, LlmError> {
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

    pub fn model(&self) -> &GeminiModel {
        &self.model
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url,
            self.model.as_str()
        )
    }

    async fn make_streaming_request(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        if let Some(first) = request.messages.first() {
            tracing::debug!(model = self.model.as_str(), prompt = %preview(&first.text), "gemini request");
        }

        let body = to_gemini_request(request);

        let response = self
            .http_client
            .post(self.endpoint_url())
            .header("x-goog-api-key", &self.api_key)
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
            tracing::warn!(status = status.as_u16(), "gemini request failed");
            return Err(LlmError::from_status(status, retry_after.as_deref(), body));
        }

        let sse_stream = parse_sse_stream(Box::pin(response.bytes_stream()));

        let mut pending_start = Some(create_message_start(Uuid::new_v4().to_string()));
        let event_stream = sse_stream.flat_map(move |result| {
            let mut events: Vec<Result<StreamEvent, LlmError>> = Vec::new();
            match result {
                Ok(chunk) => {
                    if let Some(start) = pending_start.take() {
                        events.push(Ok(start));
                    }
                    events.extend(from_gemini_response(chunk).into_iter().map(Ok));
                }
                Err(e) => events.push(Err(e)),
            }
            futures::stream::iter(events)
        });

        Ok(Box::pin(event_stream))
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        self.make_streaming_request(request).await
    }
}
