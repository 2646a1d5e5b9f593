//! Mapping between abstraction types and Gemini types

use crate::llm::core::{
    config::GenerationConfig,
    types::{FinishReason, GenerateRequest, Message, MessageRole, StreamEvent, UsageMetadata},
};

use super::types::{
    Content, GeminiGenerationConfig, GenerateContentRequest, GenerateContentResponse, Part,
};

/// Convert our abstraction request to Gemini's request format
pub fn to_gemini_request(request: GenerateRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: request.messages.into_iter().map(to_gemini_content).collect(),
        system_instruction: request.system.map(|text| Content {
            role: String::new(),
            parts: vec![Part { text }],
        }),
        generation_config: Some(to_gemini_generation_config(request.config)),
    }
}

fn to_gemini_content(message: Message) -> Content {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "model",
    };

    Content {
        role: role.to_string(),
        parts: vec![Part { text: message.text }],
    }
}

fn to_gemini_generation_config(config: GenerationConfig) -> GeminiGenerationConfig {
    GeminiGenerationConfig {
        max_output_tokens: Some(config.max_tokens),
        temperature: config.temperature,
        top_p: config.top_p,
        top_k: config.top_k,
        stop_sequences: config.stop_sequences,
    }
}

/// Convert one streamed chunk into abstraction events.
///
/// Only the first candidate is used. Text arrives on block 0; the chunk
/// carrying a finish reason also closes the message.
pub fn from_gemini_response(response: GenerateContentResponse) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_ref())
    {
        events.push(StreamEvent::Error {
            error: format!("prompt blocked: {}", reason),
        });
        return events;
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return events;
    };

    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if !part.text.is_empty() {
            events.push(StreamEvent::TextDelta {
                index: 0,
                text: part.text,
            });
        }
    }

    if let Some(reason) = candidate.finish_reason {
        let usage = response
            .usage_metadata
            .map(|u| UsageMetadata {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();

        events.push(StreamEvent::ContentBlockEnd { index: 0 });
        events.push(StreamEvent::MessageEnd {
            finish_reason: map_finish_reason(&reason),
            usage,
        });
    }

    events
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::MaxTokens,
        "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" => FinishReason::Safety,
        other => FinishReason::Other(other.to_string()),
    }
}

/// First event of every Gemini stream; the API does not assign message ids
pub fn create_message_start(message_id: String) -> StreamEvent {
    StreamEvent::MessageStart {
        id: message_id,
        usage: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_to_gemini_request_applies_config() {
        let request = GenerateRequest::from_prompt("Draft a reply", GenerationConfig::gemini_default())
            .with_system("Be polite");

        let body = to_gemini_request(request);
        assert_eq!(body.contents.len(), 1);
        assert_eq!(body.contents[0].role, "user");
        assert_eq!(body.contents[0].parts[0].text, "Draft a reply");
        assert_eq!(body.system_instruction.unwrap().parts[0].text, "Be polite");

        let config = body.generation_config.unwrap();
        assert_eq!(config.max_output_tokens, Some(2048));
        assert_eq!(config.temperature, Some(0.7));
        assert_eq!(config.top_k, Some(32));
        assert_eq!(config.top_p, Some(0.9));
    }

    #[test]
    fn test_assistant_maps_to_model_role() {
        assert_eq!(to_gemini_content(Message::assistant("ok")).role, "model");
    }

    #[test]
    fn test_text_chunk() {
        let events = from_gemini_response(parse(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#,
        ));
        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta {
                    index: 0,
                    text: "Hel".to_string()
                },
                StreamEvent::TextDelta {
                    index: 0,
                    text: "lo".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_final_chunk_closes_message() {
        let events = from_gemini_response(parse(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"!"}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":5,"candidatesTokenCount":7,"totalTokenCount":12}}"#,
        ));

        assert_eq!(events.len(), 3);
        assert_eq!(events[1], StreamEvent::ContentBlockEnd { index: 0 });
        assert_eq!(
            events[2],
            StreamEvent::MessageEnd {
                finish_reason: FinishReason::Stop,
                usage: UsageMetadata::new(5, 7),
            }
        );
    }

    #[test]
    fn test_blocked_prompt_is_error_event() {
        let events = from_gemini_response(parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#));
        assert_eq!(
            events,
            vec![StreamEvent::Error {
                error: "prompt blocked: SAFETY".to_string()
            }]
        );
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason("MAX_TOKENS"), FinishReason::MaxTokens);
        assert_eq!(map_finish_reason("SAFETY"), FinishReason::Safety);
        assert_eq!(
            map_finish_reason("RECITATION"),
            FinishReason::Other("RECITATION".to_string())
        );
    }
}
