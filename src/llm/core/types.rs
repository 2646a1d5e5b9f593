//! Core types for the LLM abstraction layer

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::GenerationConfig;

/// Request to generate text from a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<Message>,
    pub config: GenerationConfig,
    /// System prompt/instructions
    pub system: Option<String>,
}

impl GenerateRequest {
    /// Single-turn request for one user prompt
    pub fn from_prompt(prompt: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
            config,
            system: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// A single text message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Events emitted during streaming generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Response begins
    MessageStart {
        id: String,
        usage: Option<UsageMetadata>,
    },
    /// Text token(s) for the block at `index`
    TextDelta { index: usize, text: String },
    /// Content block complete
    ContentBlockEnd { index: usize },
    /// Usage update without completion
    MessageDelta { usage: UsageMetadata },
    /// Response complete
    MessageEnd {
        finish_reason: FinishReason,
        usage: UsageMetadata,
    },
    /// Error reported inside the stream
    Error { error: String },
}

/// Reason why generation finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    EndTurn,
    Stop,
    MaxTokens,
    StopSequence,
    Safety,
    Other(String),
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl UsageMetadata {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Claude,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Claude => "claude",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized provider name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProvider(pub String);

impl fmt::Display for UnknownProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown provider '{}'", self.0)
    }
}

impl std::error::Error for UnknownProvider {}

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    /// Exact, lowercase match
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gemini" => Ok(ProviderKind::Gemini),
            "claude" => Ok(ProviderKind::Claude),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_prompt_builds_single_user_turn() {
        let request = GenerateRequest::from_prompt("Summarize this", GenerationConfig::new(256))
            .with_system("Be brief");
        assert_eq!(request.messages, vec![Message::user("Summarize this")]);
        assert_eq!(request.system.as_deref(), Some("Be brief"));
        assert_eq!(request.config.max_tokens, 256);
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("gemini".parse::<ProviderKind>(), Ok(ProviderKind::Gemini));
        assert_eq!("claude".parse::<ProviderKind>(), Ok(ProviderKind::Claude));
        assert!("Claude".parse::<ProviderKind>().is_err());
        assert_eq!(
            "openai".parse::<ProviderKind>(),
            Err(UnknownProvider("openai".to_string()))
        );
    }

    #[test]
    fn test_provider_kind_display() {
        assert_eq!(ProviderKind::Claude.to_string(), "claude");
        assert_eq!(serde_json::to_string(&ProviderKind::Gemini).unwrap(), "\"gemini\"");
    }

    #[test]
    fn test_usage_total() {
        let usage = UsageMetadata::new(12, 30);
        assert_eq!(usage.total_tokens, 42);
    }

    #[test]
    fn test_stream_event_tagging() {
        let event = StreamEvent::TextDelta {
            index: 0,
            text: "Hi".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "text_delta");
        assert_eq!(json["text"], "Hi");
    }
}
