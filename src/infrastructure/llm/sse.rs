//! Server-sent events: line decoding and the chunk frame format

use std::collections::VecDeque;

use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::domain::{StreamChunk, Usage};

/// Data payload closing a stream after its end marker
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder turning raw bytes into SSE `data:` payloads.
///
/// Bytes are buffered until a full line arrives, so multi-byte characters
/// split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning the payloads of every complete `data:` line
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = parse_line(&line) {
                payloads.push(payload);
            }
        }

        payloads
    }

    /// Flush a trailing line that had no newline
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        parse_line(&line)
    }
}

fn parse_line(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\n', '\r']);

    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data.is_empty() {
        None
    } else {
        Some(data.to_string())
    }
}

/// Adapt a byte stream into a stream of SSE data payloads.
///
/// A transport error is yielded once and ends the stream.
pub fn data_payloads<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, E>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send,
    E: Send + 'static,
{
    let state = (bytes, SseDecoder::new(), VecDeque::new(), false);

    stream::unfold(state, |(mut bytes, mut decoder, mut pending, mut exhausted)| async move {
        loop {
            if let Some(payload) = pending.pop_front() {
                return Some((Ok(payload), (bytes, decoder, pending, exhausted)));
            }
            if exhausted {
                return None;
            }

            match bytes.next().await {
                Some(Ok(chunk)) => pending.extend(decoder.push(chunk.as_ref())),
                Some(Err(e)) => {
                    exhausted = true;
                    return Some((Err(e), (bytes, decoder, pending, exhausted)));
                }
                None => {
                    exhausted = true;
                    pending.extend(decoder.finish());
                }
            }
        }
    })
}

/// A decoded frame of the responder's stream
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    Chunk(StreamChunk),
    Done,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Encode a chunk as the JSON payload of one `data:` line
pub fn encode_chunk(chunk: &StreamChunk) -> String {
    let frame = match chunk {
        StreamChunk::Content { content } => WireFrame {
            content: Some(content.clone()),
            ..Default::default()
        },
        StreamChunk::End { model, usage } => WireFrame {
            done: true,
            model: Some(model.clone()),
            usage: Some(usage.clone()),
            ..Default::default()
        },
        StreamChunk::Error { message } => WireFrame {
            error: Some(message.clone()),
            ..Default::default()
        },
    };

    serde_json::to_string(&frame).unwrap_or_else(|_| r#"{"error":"unencodable chunk"}"#.to_string())
}

/// Decode one `data:` payload produced by [`encode_chunk`]
pub fn decode_frame(payload: &str) -> Result<SseFrame, String> {
    if payload.trim() == DONE_SENTINEL {
        return Ok(SseFrame::Done);
    }

    let frame: WireFrame =
        serde_json::from_str(payload).map_err(|e| format!("Invalid stream frame: {}", e))?;

    if let Some(message) = frame.error {
        Ok(SseFrame::Chunk(StreamChunk::error(message)))
    } else if frame.done {
        Ok(SseFrame::Chunk(StreamChunk::end(
            frame.model.unwrap_or_default(),
            frame.usage.unwrap_or_default(),
        )))
    } else if let Some(content) = frame.content {
        Ok(SseFrame::Chunk(StreamChunk::content(content)))
    } else {
        Err(format!("Unrecognized stream frame: {}", payload))
    }
}
