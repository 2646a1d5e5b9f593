//! LLM Abstraction Layer
//!
//! A single streaming interface over Anthropic Claude and Google Gemini,
//! both reached directly over HTTPS with API keys.

pub mod claude;
pub mod core;
pub mod gemini;

pub use self::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{create_provider, EventStream, LlmProvider},
    types::{
        FinishReason, GenerateRequest, Message, MessageRole, ProviderKind, StreamEvent,
        UnknownProvider, UsageMetadata,
    },
};

pub use claude::{ClaudeClient, ClaudeModel};
pub use gemini::{GeminiClient, GeminiModel};
