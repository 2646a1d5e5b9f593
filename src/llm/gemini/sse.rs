//! Gemini SSE decoding (`alt=sse` responses)

use std::pin::Pin;

use futures::stream::Stream;
use futures::StreamExt;

use crate::llm::core::error::LlmError;
use crate::llm::core::sse::{sse_frames, ByteStream};

use super::types::GenerateContentResponse;

/// Parse a response body as a stream of `GenerateContentResponse` chunks.
///
/// Gemini frames carry only `data: <json>`.
pub fn parse_sse_stream(
    byte_stream: ByteStream,
) -> Pin<Box<dyn Stream<Item = Result<GenerateContentResponse, LlmError>> + Send>> {
    let responses = sse_frames(byte_stream).map(|frame| {
        let frame = frame?;
        serde_json::from_str::<GenerateContentResponse>(&frame.data).map_err(|e| {
            LlmError::SerializationError(format!(
                "Failed to parse SSE data: {}. Data: {}",
                e, frame.data
            ))
        })
    });

    Box::pin(responses)
}
