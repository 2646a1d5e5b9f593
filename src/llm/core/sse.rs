//! Server-Sent Events framing shared by the provider parsers

use std::pin::Pin;

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;

use super::error::LlmError;

/// Raw byte stream of an HTTP response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// One dispatched SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if any
    pub event: Option<String>,
    /// All `data:` lines joined with `\n`
    pub data: String,
}

/// Accumulates body bytes and yields complete frames.
///
/// Bytes are buffered undecoded so a multi-byte character split across
/// chunks is decoded once whole.
#[derive(Debug, Default)]
pub struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseFrame>, LlmError> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some((end, separator_len)) = find_frame_end(&self.pending) {
            let raw: Vec<u8> = self.pending.drain(..end + separator_len).collect();
            let text = std::str::from_utf8(&raw[..end])
                .map_err(|e| LlmError::StreamError(format!("Invalid UTF-8 in stream: {}", e)))?;

            if let Some(frame) = parse_frame(text) {
                frames.push(frame);
            }
        }

        Ok(frames)
    }
}

/// Position and length of the earliest blank-line separator
fn find_frame_end(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buf, b"\n\n").map(|pos| (pos, 2));
    let crlf = find(buf, b"\r\n\r\n").map(|pos| (pos, 4));

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_frame(text: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in text.lines() {
        // Comment lines (keep-alives)
        if line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => event = Some(value.to_string()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if data.is_empty() {
        return None;
    }

    Some(SseFrame {
        event,
        data: data.join("\n"),
    })
}

/// Split a response body into SSE frames
pub fn sse_frames(
    byte_stream: ByteStream,
) -> Pin<Box<dyn Stream<Item = Result<SseFrame, LlmError>> + Send>> {
    let mut buffer = SseBuffer::default();

    let frames = byte_stream.flat_map(move |chunk| {
        let items: Vec<Result<SseFrame, LlmError>> = match chunk {
            Ok(bytes) => match buffer.push(&bytes) {
                Ok(frames) => frames.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            },
            Err(e) => vec![Err(LlmError::StreamError(e.to_string()))],
        };
        futures::stream::iter(items)
    });

    Box::pin(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_single_frame() {
        let mut buffer = SseBuffer::default();
        let frames = buffer.push(b"event: ping\ndata: {\"type\":\"ping\"}\n\n").unwrap();
        assert_eq!(
            frames,
            vec![SseFrame {
                event: Some("ping".to_string()),
                data: r#"{"type":"ping"}"#.to_string(),
            }]
        );
    }

    #[test]
    fn test_crlf_separators() {
        let mut buffer = SseBuffer::default();
        let frames = buffer.push(b"data: {\"a\":1}\r\n\r\ndata: {\"a\":2}\r\n\r\n").unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, r#"{"a":1}"#);
        assert!(frames[0].event.is_none());
        assert_eq!(frames[1].data, r#"{"a":2}"#);
    }

    #[test]
    fn test_partial_frame_is_held() {
        let mut buffer = SseBuffer::default();
        assert!(buffer.push(b"data: {\"a\"").unwrap().is_empty());
        let frames = buffer.push(b":1}\n\n").unwrap();
        assert_eq!(frames[0].data, r#"{"a":1}"#);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let payload = "data: café\n\n".as_bytes();
        // Split inside the two-byte 'é'
        let split = payload.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut buffer = SseBuffer::default();
        assert!(buffer.push(&payload[..split]).unwrap().is_empty());
        let frames = buffer.push(&payload[split..]).unwrap();
        assert_eq!(frames[0].data, "café");
    }

    #[test]
    fn test_comments_and_multiline_data() {
        let mut buffer = SseBuffer::default();
        let frames = buffer.push(b": keep-alive\n\ndata: line one\ndata: line two\n\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "line one\nline two");
    }

    #[tokio::test]
    async fn test_sse_frames_over_chunks() {
        let byte_stream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"event: a\ndata: 1\n\nevent: b\n")),
            Ok(Bytes::from_static(b"data: 2\n\n")),
        ]));

        let frames: Vec<_> = sse_frames(byte_stream).collect().await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap().event.as_deref(), Some("a"));
        assert_eq!(frames[1].as_ref().unwrap().data, "2");
    }
}
