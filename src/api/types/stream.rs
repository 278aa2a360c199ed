//! Chunk streams as server-sent events

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{stream, Stream, StreamExt};

use crate::domain::{ChunkStream, StreamChunk};
use crate::infrastructure::llm::{encode_chunk, DONE_SENTINEL};

/// One `data:` event per chunk, plus `[DONE]` after a successful end
pub fn chunk_events(chunks: ChunkStream) -> impl Stream<Item = Result<Event, Infallible>> + Send {
    chunks.flat_map(|chunk| {
        let mut events = vec![Event::default().data(encode_chunk(&chunk))];
        if matches!(chunk, StreamChunk::End { .. }) {
            events.push(Event::default().data(DONE_SENTINEL));
        }
        stream::iter(events.into_iter().map(Ok))
    })
}

pub fn sse_response(
    chunks: ChunkStream,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    Sse::new(chunk_events(chunks)).keep_alive(KeepAlive::default())
}
