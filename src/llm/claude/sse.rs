//! Anthropic SSE event decoding

use std::pin::Pin;

use futures::stream::Stream;
use futures::StreamExt;

use crate::llm::core::error::LlmError;
use crate::llm::core::sse::{sse_frames, ByteStream, SseFrame};

use super::types::ClaudeStreamEvent;

/// Parse a response body as Anthropic stream events.
///
/// Each frame carries `event: <type>` and a JSON `data:` payload whose
/// `type` field repeats the event name.
pub fn parse_sse_stream(
    byte_stream: ByteStream,
) -> Pin<Box<dyn Stream<Item = Result<ClaudeStreamEvent, LlmError>> + Send>> {
    let events = sse_frames(byte_stream).map(|frame| frame.and_then(|f| decode_event(&f)));
    Box::pin(events)
}

fn decode_event(frame: &SseFrame) -> Result<ClaudeStreamEvent, LlmError> {
    serde_json::from_str::<ClaudeStreamEvent>(&frame.data).map_err(|e| {
        LlmError::SerializationError(format!(
            "Failed to parse Claude SSE event (type: {:?}): {}. Data: {}",
            frame.event, e, frame.data
        ))
    })
}
