//! Mapping between abstraction types and Anthropic types

use crate::llm::core::types::{
    FinishReason, GenerateRequest, Message, MessageRole, StreamEvent, UsageMetadata,
};

use super::types::{
    ClaudeContentBlockStart, ClaudeContentDelta, ClaudeMessage, ClaudeStreamEvent,
    MessagesRequest,
};

/// Build the streaming Messages API body for `model`
pub fn to_claude_request(model: &str, request: GenerateRequest) -> MessagesRequest {
    MessagesRequest {
        model: model.to_string(),
        max_tokens: request.config.max_tokens,
        messages: request.messages.into_iter().map(to_claude_message).collect(),
        system: request.system,
        temperature: request.config.temperature,
        top_p: request.config.top_p,
        top_k: request.config.top_k,
        stop_sequences: request.config.stop_sequences,
        stream: true,
    }
}

fn to_claude_message(message: Message) -> ClaudeMessage {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    };

    ClaudeMessage {
        role: role.to_string(),
        content: message.text,
    }
}

/// Convert one Anthropic event into zero or more abstraction events.
///
/// `usage` accumulates across the stream: input tokens arrive in
/// `message_start`, output tokens in `message_delta`.
pub fn from_claude_event(event: ClaudeStreamEvent, usage: &mut UsageMetadata) -> Vec<StreamEvent> {
    match event {
        ClaudeStreamEvent::MessageStart { message } => {
            *usage = UsageMetadata::new(message.usage.input_tokens, message.usage.output_tokens);
            vec![StreamEvent::MessageStart {
                id: message.id,
                usage: Some(*usage),
            }]
        }
        ClaudeStreamEvent::ContentBlockStart {
            index,
            content_block: ClaudeContentBlockStart::Text { text },
        } if !text.is_empty() => vec![StreamEvent::TextDelta { index, text }],
        ClaudeStreamEvent::ContentBlockStart { .. } => vec![],
        ClaudeStreamEvent::ContentBlockDelta {
            index,
            delta: ClaudeContentDelta::TextDelta { text },
        } => vec![StreamEvent::TextDelta { index, text }],
        ClaudeStreamEvent::ContentBlockDelta { .. } => vec![],
        ClaudeStreamEvent::ContentBlockStop { index } => vec![StreamEvent::ContentBlockEnd { index }],
        ClaudeStreamEvent::MessageDelta { delta, usage: update } => {
            if let Some(update) = update {
                *usage = UsageMetadata::new(usage.input_tokens, update.output_tokens);
            }

            match delta.stop_reason {
                Some(reason) => vec![StreamEvent::MessageEnd {
                    finish_reason: map_stop_reason(&reason),
                    usage: *usage,
                }],
                None => vec![StreamEvent::MessageDelta { usage: *usage }],
            }
        }
        ClaudeStreamEvent::Error { error } => vec![StreamEvent::Error {
            error: format!("{}: {}", error.error_type, error.message),
        }],
        ClaudeStreamEvent::MessageStop | ClaudeStreamEvent::Ping | ClaudeStreamEvent::Unknown => {
            vec![]
        }
    }
}

fn map_stop_reason(reason: &str) -> FinishReason {
    match reason {
        "end_turn" => FinishReason::EndTurn,
        "max_tokens" => FinishReason::MaxTokens,
        "stop_sequence" => FinishReason::StopSequence,
        "refusal" => FinishReason::Safety,
        other => FinishReason::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::core::config::GenerationConfig;

    fn parse(json: &str) -> ClaudeStreamEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_to_claude_request() {
        let request = GenerateRequest::from_prompt("What's new?", GenerationConfig::claude_default())
            .with_system("You summarize email.");

        let body = to_claude_request("claude-3-haiku-20240307", request);
        assert_eq!(body.model, "claude-3-haiku-20240307");
        assert_eq!(body.max_tokens, 2048);
        assert_eq!(body.system.as_deref(), Some("You summarize email."));
        assert_eq!(
            body.messages,
            vec![ClaudeMessage {
                role: "user".to_string(),
                content: "What's new?".to_string(),
            }]
        );
        assert!(body.stream);
        assert!(body.temperature.is_none());
    }

    #[test]
    fn test_assistant_turn_role() {
        assert_eq!(to_claude_message(Message::assistant("ok")).role, "assistant");
    }

    #[test]
    fn test_message_lifecycle_usage() {
        let mut usage = UsageMetadata::default();

        let start = from_claude_event(
            parse(r#"{"type":"message_start","message":{"id":"msg_1","type":"message","role":"assistant","content":[],"model":"claude-3-haiku-20240307","usage":{"input_tokens":12,"output_tokens":1}}}"#),
            &mut usage,
        );
        assert_eq!(
            start,
            vec![StreamEvent::MessageStart {
                id: "msg_1".to_string(),
                usage: Some(UsageMetadata::new(12, 1)),
            }]
        );

        let delta = from_claude_event(
            parse(r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#),
            &mut usage,
        );
        assert_eq!(
            delta,
            vec![StreamEvent::TextDelta {
                index: 0,
                text: "Hi".to_string(),
            }]
        );

        let end = from_claude_event(
            parse(r#"{"type":"message_delta","delta":{"stop_reason":"end_turn","stop_sequence":null},"usage":{"output_tokens":30}}"#),
            &mut usage,
        );
        assert_eq!(
            end,
            vec![StreamEvent::MessageEnd {
                finish_reason: FinishReason::EndTurn,
                usage: UsageMetadata::new(12, 30),
            }]
        );
    }

    #[test]
    fn test_empty_block_start_and_pings_emit_nothing() {
        let mut usage = UsageMetadata::default();
        assert!(from_claude_event(
            parse(r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#),
            &mut usage
        )
        .is_empty());
        assert!(from_claude_event(parse(r#"{"type":"ping"}"#), &mut usage).is_empty());
        assert!(from_claude_event(parse(r#"{"type":"message_stop"}"#), &mut usage).is_empty());
    }

    #[test]
    fn test_error_event() {
        let mut usage = UsageMetadata::default();
        let events = from_claude_event(
            parse(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#),
            &mut usage,
        );
        assert_eq!(
            events,
            vec![StreamEvent::Error {
                error: "overloaded_error: Overloaded".to_string(),
            }]
        );
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("max_tokens"), FinishReason::MaxTokens);
        assert_eq!(map_stop_reason("stop_sequence"), FinishReason::StopSequence);
        assert_eq!(
            map_stop_reason("pause_turn"),
            FinishReason::Other("pause_turn".to_string())
        );
    }
}
