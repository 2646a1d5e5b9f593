//! Prompt routing between the configured providers

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::clamp_limit;
use crate::cache::KeyValueCache;
use crate::error::AppError;
use crate::llm::{GenerateRequest, GenerationConfig, LlmProvider, ProviderKind};
use crate::logging::preview;
use crate::models::{AiConversation, AiRequest, AiResponse};
use crate::repository::{ConversationStore, EmailStore};

/// Responses are reused for an hour
pub const RESPONSE_CACHE_TTL: Duration = Duration::from_secs(3600);

#[async_trait]
pub trait AiUseCase: Send + Sync {
    async fn process_ai_request(&self, user_id: &str, request: AiRequest) -> Result<AiResponse, AppError>;

    async fn list_conversations(&self, user_id: &str, limit: i64) -> Result<Vec<AiConversation>, AppError>;
}

pub struct AiService {
    gemini: Arc<dyn LlmProvider>,
    claude: Option<Arc<dyn LlmProvider>>,
    cache: Option<Arc<dyn KeyValueCache>>,
    conversations: Option<Arc<dyn ConversationStore>>,
    emails: Option<Arc<dyn EmailStore>>,
}

impl AiService {
    pub fn new(gemini: Arc<dyn LlmProvider>, claude: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            gemini,
            claude,
            cache: None,
            conversations: None,
            emails: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn KeyValueCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_conversations(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.conversations = Some(store);
        self
    }

    /// Lets requests link a conversation to one of the caller's emails
    pub fn with_emails(mut self, store: Arc<dyn EmailStore>) -> Self {
        self.emails = Some(store);
        self
    }

    pub fn claude_enabled(&self) -> bool {
        self.claude.is_some()
    }

    fn select_provider(&self, name: Option<&str>) -> Result<(ProviderKind, Arc<dyn LlmProvider>), AppError> {
        let name = name.filter(|n| !n.is_empty()).unwrap_or("gemini");

        match name.parse::<ProviderKind>() {
            Ok(ProviderKind::Gemini) => Ok((ProviderKind::Gemini, self.gemini.clone())),
            Ok(ProviderKind::Claude) => self
                .claude
                .clone()
                .map(|provider| (ProviderKind::Claude, provider))
                .ok_or_else(|| AppError::service_unavailable("Claude service not available")),
            Err(_) => Err(AppError::bad_request(
                "Invalid provider. Use 'gemini' or 'claude'",
            )),
        }
    }

    async fn cached(&self, key: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.fetch(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, "response cache read failed");
                None
            }
        }
    }

    async fn remember(&self, key: &str, response: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(key, response, Some(RESPONSE_CACHE_TTL)).await {
                tracing::warn!(error = %e, "response cache write failed");
            }
        }
    }

    /// Resolve `email_id` to an email the caller owns.
    ///
    /// Without an email store the link cannot be checked and is dropped.
    async fn owned_email(&self, user_id: &str, email_id: Option<&str>) -> Result<Option<String>, AppError> {
        let Some(email_id) = email_id.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        let Some(store) = &self.emails else {
            tracing::debug!(user_id, email_id, "no email store, dropping email link");
            return Ok(None);
        };

        match store.get_by_id(email_id, user_id).await {
            Ok(Some(email)) => Ok(Some(email.id)),
            Ok(None) => Err(AppError::not_found("Email not found")),
            Err(e) => {
                tracing::error!(user_id, email_id, error = %e, "failed to load email");
                Err(AppError::database_error())
            }
        }
    }

    async fn record(
        &self,
        user_id: &str,
        email_id: Option<String>,
        request: &AiRequest,
        response: &AiResponse,
    ) {
        let Some(store) = &self.conversations else {
            return;
        };

        let conversation = AiConversation {
            id: Uuid::new_v4().to_string(),
            email_id,
            user_id: user_id.to_string(),
            prompt: request.prompt.clone(),
            response: response.response.clone(),
            provider: response.provider.clone(),
            created_at: Utc::now(),
        };

        if let Err(e) = store.create(&conversation).await {
            tracing::warn!(user_id, error = %e, "failed to record conversation");
        }
    }
}

/// `ai:{provider}:{sha256(prompt)}`
pub fn response_cache_key(provider: ProviderKind, prompt: &str) -> String {
    format!("ai:{}:{:x}", provider, Sha256::digest(prompt.as_bytes()))
}

fn generation_config(kind: ProviderKind) -> GenerationConfig {
    match kind {
        ProviderKind::Gemini => GenerationConfig::gemini_default(),
        ProviderKind::Claude => GenerationConfig::claude_default(),
    }
}

#[async_trait]
impl AiUseCase for AiService {
    async fn process_ai_request(&self, user_id: &str, request: AiRequest) -> Result<AiResponse, AppError> {
        if request.prompt.trim().is_empty() {
            return Err(AppError::bad_request("Prompt is required"));
        }

        let (kind, provider) = self.select_provider(request.provider.as_deref())?;
        let email_id = self.owned_email(user_id, request.email_id.as_deref()).await?;
        let cache_key = response_cache_key(kind, &request.prompt);

        tracing::info!(
            user_id,
            provider = %kind,
            prompt = %preview(&request.prompt),
            "processing ai request"
        );

        let text = match self.cached(&cache_key).await {
            Some(text) => {
                tracing::debug!(provider = %kind, "serving cached response");
                text
            }
            None => {
                let generate = GenerateRequest::from_prompt(request.prompt.clone(), generation_config(kind));
                let text = provider.generate_text(generate).await.map_err(|e| {
                    tracing::error!(provider = %kind, error = %e, "generation failed");
                    AppError::internal(format!("Failed to generate response: {}", e))
                })?;
                self.remember(&cache_key, &text).await;
                text
            }
        };

        let response = AiResponse {
            response: text,
            provider: kind.to_string(),
        };
        self.record(user_id, email_id, &request, &response).await;

        Ok(response)
    }

    async fn list_conversations(&self, user_id: &str, limit: i64) -> Result<Vec<AiConversation>, AppError> {
        let Some(store) = &self.conversations else {
            return Ok(Vec::new());
        };

        store
            .get_by_user_id(user_id, clamp_limit(limit))
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "failed to load conversations");
                AppError::database_error()
            })
    }
}
