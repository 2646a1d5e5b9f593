//! Provider trait for LLM implementations

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::Stream;
use futures::StreamExt;

use super::{
    error::LlmError,
    types::{GenerateRequest, ProviderKind, StreamEvent},
};
use crate::llm::claude::{ClaudeClient, ClaudeModel};
use crate::llm::gemini::{GeminiClient, GeminiModel};

/// Boxed stream of generation events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Main interface that all LLM provider implementations must satisfy
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Which provider this is, used in logs and errors
    fn kind(&self) -> ProviderKind;

    /// Send the request and return the incremental response events.
    ///
    /// Transport failures and non-success statuses are returned before any
    /// event is produced.
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError>;

    /// Drain the stream and join all text deltas.
    ///
    /// An in-stream error event or an empty result is an error.
    async fn generate_text(&self, request: GenerateRequest) -> Result<String, LlmError> {
        let mut events = self.stream_generate(request).await?;
        let mut text = String::new();

        while let Some(event) = events.next().await {
            match event? {
                StreamEvent::TextDelta { text: delta, .. } => text.push_str(&delta),
                StreamEvent::Error { error } => {
                    return Err(LlmError::ProviderError {
                        code: self.kind().to_string(),
                        message: error,
                    });
                }
                _ => {}
            }
        }

        if text.is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: self.kind().to_string(),
            });
        }

        Ok(text)
    }
}

/// Create a provider client for `kind` using an API key and a model id
///
/// # Example
///
/// ```rust,no_run
/// use ai_assistant::llm::{create_provider, ProviderKind};
///
/// let provider = create_provider(ProviderKind::Claude, "sk-ant-...", "claude-3-haiku-20240307")?;
/// # Ok::<(), ai_assistant::llm::LlmError>(())
/// ```
pub fn create_provider(
    kind: ProviderKind,
    api_key: &str,
    model: &str,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match kind {
        ProviderKind::Claude => {
            let client = ClaudeClient::new(api_key, ClaudeModel::from_id(model))?;
            Ok(Arc::new(client))
        }
        ProviderKind::Gemini => {
            let client = GeminiClient::new(api_key, GeminiModel::from_id(model))?;
            Ok(Arc::new(client))
        }
    }
}
