//! Transport that reaches the responder over HTTP

use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

use super::transport::ResponderTransport;
use crate::domain::{
    AiResponse, ChunkStream, DomainError, Message, ModelCatalog, ProviderSettings,
    ResponderHealth, StreamChunk, TransportError,
};
use crate::infrastructure::llm::sse::{data_payloads, decode_frame, SseFrame};

type PayloadStream = Pin<Box<dyn Stream<Item = Result<String, reqwest::Error>> + Send>>;

/// Speaks the responder's JSON and SSE surface with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpResponderTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpResponderTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, TransportError> {
        let response = request.send().await.map_err(request_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::status(status.as_u16(), error_message(&body)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let request = self.client.get(self.url(path)).timeout(self.timeout);
        let response = self.send(request).await?;
        read_json(response).await
    }
}

#[async_trait]
impl ResponderTransport for HttpResponderTransport {
    async fn process(&self, message: &Message) -> Result<AiResponse, TransportError> {
        let request = self
            .client
            .post(self.url("/process"))
            .timeout(self.timeout)
            .json(message);

        let response = self.send(request).await?;
        read_json(response).await
    }

    async fn open_stream(&self, message: &Message) -> Result<ChunkStream, TransportError> {
        let request = self.client.post(self.url("/stream")).json(message);

        // Only establishing the stream is bounded; the body may take longer
        let response = tokio::time::timeout(self.timeout, self.send(request))
            .await
            .map_err(|_| {
                TransportError::timeout(format!("no response within {}s", self.timeout.as_secs()))
            })??;

        debug!(responder = %self.base_url, "Responder stream established");

        let payloads: PayloadStream = Box::pin(data_payloads(Box::pin(response.bytes_stream())));
        Ok(Box::pin(decode_chunks(payloads)))
    }

    async fn health(&self) -> Result<ResponderHealth, TransportError> {
        self.get("/health").await
    }

    async fn list_models(&self) -> Result<ModelCatalog, TransportError> {
        self.get("/models").await
    }

    async fn get_config(&self) -> Result<ProviderSettings, TransportError> {
        self.get("/config").await
    }

    fn target(&self) -> String {
        self.base_url.clone()
    }
}

/// Turn SSE payloads into chunks, ending with exactly one terminal chunk.
///
/// A body that stops before its end marker yields an `Error` chunk.
fn decode_chunks(payloads: PayloadStream) -> impl Stream<Item = StreamChunk> + Send {
    stream::unfold((payloads, false), |(mut payloads, finished)| async move {
        if finished {
            return None;
        }

        let chunk = match payloads.next().await {
            Some(Ok(payload)) => match decode_frame(&payload) {
                Ok(SseFrame::Chunk(chunk)) => chunk,
                Ok(SseFrame::Done) => {
                    StreamChunk::error("Responder stream closed without an end marker")
                }
                Err(e) => StreamChunk::error(e),
            },
            Some(Err(e)) => StreamChunk::error(format!("Responder stream interrupted: {}", e)),
            None => StreamChunk::error("Responder stream ended before completion"),
        };

        let finished = chunk.is_terminal();
        Some((chunk, (payloads, finished)))
    })
}

fn request_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::timeout(err.to_string())
    } else if err.is_decode() {
        TransportError::malformed(err.to_string())
    } else {
        TransportError::connect(err.to_string())
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TransportError> {
    let body = response.bytes().await.map_err(request_error)?;
    serde_json::from_slice(&body).map_err(|e| TransportError::malformed(e.to_string()))
}

/// Pull `error.message` out of an error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
