//! Anthropic Messages API request and stream event types

use serde::{Deserialize, Serialize};

/// Body of `POST /v1/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<ClaudeMessage>,
    /// System prompt (top-level field)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    pub stream: bool,
}

/// A single text message; `role` is "user" or "assistant"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudeMessage {
    pub role: String,
    pub content: String,
}

/// SSE event payloads from the streaming Messages API
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeStreamEvent {
    MessageStart {
        message: ClaudeMessageData,
    },
    ContentBlockStart {
        index: usize,
        content_block: ClaudeContentBlockStart,
    },
    ContentBlockDelta {
        index: usize,
        delta: ClaudeContentDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        delta: ClaudeMessageDeltaData,
        usage: Option<ClaudeUsage>,
    },
    MessageStop,
    /// Keep-alive
    Ping,
    Error {
        error: ClaudeErrorData,
    },
    /// Event types added to the API later
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeMessageData {
    pub id: String,
    pub model: String,
    pub usage: ClaudeUsage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeContentBlockStart {
    Text {
        #[serde(default)]
        text: String,
    },
    /// Non-text blocks are ignored
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeContentDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeMessageDeltaData {
    /// Set when the message completes
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeUsage {
    /// Absent in message_delta updates
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeErrorData {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = MessagesRequest {
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 2048,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: "Hello".to_string(),
            }],
            system: None,
            temperature: None,
            top_p: None,
            top_k: None,
            stop_sequences: None,
            stream: true,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "claude-3-haiku-20240307",
                "max_tokens": 2048,
                "messages": [{"role": "user", "content": "Hello"}],
                "stream": true
            })
        );
    }

    #[test]
    fn test_unknown_event_type_tolerated() {
        let event: ClaudeStreamEvent =
            serde_json::from_str(r#"{"type":"signature_delta_v2","foo":1}"#).unwrap();
        assert!(matches!(event, ClaudeStreamEvent::Unknown));
    }

    #[test]
    fn test_non_text_delta_tolerated() {
        let delta: ClaudeContentDelta =
            serde_json::from_str(r#"{"type":"input_json_delta","partial_json":"{"}"#).unwrap();
        assert!(matches!(delta, ClaudeContentDelta::Other));
    }
}
