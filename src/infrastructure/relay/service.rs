//! Forwarder side: relays messages to a responder and records the outcome

use std::sync::Arc;
use std::time::Instant;

use futures::{stream, StreamExt};
use tracing::{debug, info, warn};

use super::retry::retry_with_backoff;
use super::transport::ResponderTransport;
use crate::domain::{
    AiResponse, ChunkStream, ConversationEntry, ConversationSnapshot, ConversationStore,
    DomainError, Message, ModelCatalog, ProviderSettings, ResponderHealth, RetryPolicy,
    StreamChunk, UsageStats,
};

/// Provider label for entries whose responder did not name one
const RESPONDER_LABEL: &str = "responder";

/// Retrying relay in front of a responder, with the conversation store it feeds
#[derive(Debug, Clone)]
pub struct RelayService {
    transport: Arc<dyn ResponderTransport>,
    store: Arc<dyn ConversationStore>,
    policy: RetryPolicy,
}

impl RelayService {
    pub fn new(
        transport: Arc<dyn ResponderTransport>,
        store: Arc<dyn ConversationStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Relay one message and record the final outcome.
    ///
    /// Invalid messages are rejected before anything is sent. A terminal
    /// rejection, local or by the responder, is recorded as one error entry;
    /// exhausted retries are not recorded.
    pub async fn send_message(&self, message: Message) -> Result<AiResponse, DomainError> {
        let started = Instant::now();
        self.validate_or_record(&message, started).await?;

        info!(
            responder = %self.transport.target(),
            chars = message.content.chars().count(),
            "Relaying message"
        );

        let transport = self.transport.clone();
        let result = retry_with_backoff(&self.policy, "send_message", |_| {
            let transport = transport.clone();
            let message = message.clone();
            async move { transport.process(&message).await }
        })
        .await;

        match result {
            Ok(response) => {
                info!(
                    model = %response.model,
                    tokens = response.usage.total_tokens,
                    cost = response.usage.estimated_cost,
                    "Relay succeeded"
                );
                self.record(message, response.clone()).await;
                Ok(response)
            }
            Err(e) => {
                self.record_rejection(&message, &e, started).await;
                Err(e)
            }
        }
    }

    /// Relay one message as a stream.
    ///
    /// Only opening the stream is retried. The exchange is recorded when the
    /// stream reaches its `End` or `Error` chunk; a stream dropped early
    /// records nothing.
    pub async fn send_message_stream(&self, message: Message) -> Result<ChunkStream, DomainError> {
        let started = Instant::now();
        self.validate_or_record(&message, started).await?;

        info!(responder = %self.transport.target(), "Relaying message as stream");

        let transport = self.transport.clone();
        let result = retry_with_backoff(&self.policy, "send_message_stream", |_| {
            let transport = transport.clone();
            let message = message.clone();
            async move { transport.open_stream(&message).await }
        })
        .await;

        let chunks = match result {
            Ok(chunks) => chunks,
            Err(e) => {
                self.record_rejection(&message, &e, started).await;
                return Err(e);
            }
        };

        let state = RecordingStream {
            chunks,
            store: self.store.clone(),
            message,
            text: String::new(),
            started,
            finished: false,
        };

        Ok(Box::pin(stream::unfold(state, RecordingStream::next_chunk)))
    }

    pub async fn check_health(&self) -> Result<ResponderHealth, DomainError> {
        let transport = self.transport.clone();
        retry_with_backoff(&self.policy, "check_health", |_| {
            let transport = transport.clone();
            async move { transport.health().await }
        })
        .await
    }

    pub async fn list_models(&self) -> Result<ModelCatalog, DomainError> {
        let transport = self.transport.clone();
        retry_with_backoff(&self.policy, "list_models", |_| {
            let transport = transport.clone();
            async move { transport.list_models().await }
        })
        .await
    }

    pub async fn get_config(&self) -> Result<ProviderSettings, DomainError> {
        let transport = self.transport.clone();
        retry_with_backoff(&self.policy, "get_config", |_| {
            let transport = transport.clone();
            async move { transport.get_config().await }
        })
        .await
    }

    pub async fn history(&self) -> Result<Vec<ConversationEntry>, DomainError> {
        self.store.history().await
    }

    pub async fn stats(&self) -> Result<UsageStats, DomainError> {
        self.store.stats().await
    }

    pub async fn snapshot(&self) -> Result<ConversationSnapshot, DomainError> {
        self.store.snapshot().await
    }

    async fn record(&self, message: Message, response: AiResponse) {
        record_into(self.store.as_ref(), message, response).await;
    }

    async fn validate_or_record(&self, message: &Message, started: Instant) -> Result<(), DomainError> {
        if let Err(e) = message.validate() {
            debug!(error = %e, "Message rejected before sending");
            self.record_rejection(message, &e, started).await;
            return Err(e);
        }
        Ok(())
    }

    /// Terminal rejections become error entries; anything else is not recorded
    async fn record_rejection(&self, message: &Message, error: &DomainError, started: Instant) {
        if let DomainError::InvalidRequest { message: reason } = error {
            let response = AiResponse::error(
                RESPONDER_LABEL,
                message.model.clone().unwrap_or_default(),
                reason.clone(),
                started.elapsed(),
            );
            self.record(message.clone(), response).await;
        } else {
            debug!(kind = error.kind(), "Relay failure not recorded");
        }
    }
}

async fn record_into(store: &dyn ConversationStore, message: Message, response: AiResponse) {
    if let Err(e) = store.record(message, response).await {
        warn!(error = %e, "Failed to record exchange");
    }
}

struct RecordingStream {
    chunks: ChunkStream,
    store: Arc<dyn ConversationStore>,
    message: Message,
    text: String,
    started: Instant,
    finished: bool,
}

impl RecordingStream {
    async fn next_chunk(mut self) -> Option<(StreamChunk, Self)> {
        if self.finished {
            return None;
        }

        let chunk = self
            .chunks
            .next()
            .await
            .unwrap_or_else(|| StreamChunk::error("Responder stream ended before completion"));

        match &chunk {
            StreamChunk::Content { content } => self.text.push_str(content),
            StreamChunk::End { model, usage } => {
                self.finished = true;
                let response = AiResponse::success(
                    RESPONDER_LABEL,
                    model.clone(),
                    std::mem::take(&mut self.text),
                    usage.clone(),
                    self.started.elapsed(),
                );
                info!(model = %model, tokens = usage.total_tokens, "Relayed stream finished");
                record_into(self.store.as_ref(), self.message.clone(), response).await;
            }
            StreamChunk::Error { message } => {
                self.finished = true;
                let response = AiResponse::error(
                    RESPONDER_LABEL,
                    self.message.model.clone().unwrap_or_default(),
                    message.clone(),
                    self.started.elapsed(),
                );
                warn!(error = %message, "Relayed stream failed");
                record_into(self.store.as_ref(), self.message.clone(), response).await;
            }
        }

        Some((chunk, self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProviderConfig, ResponseStatus, TransportError, Usage};
    use crate::infrastructure::conversation::InMemoryConversationStore;
    use crate::infrastructure::llm::AiProvider;
    use crate::infrastructure::relay::transport::mock::ScriptedTransport;
    use crate::infrastructure::relay::InProcessTransport;
    use crate::infrastructure::services::ResponderService;
    use std::time::Duration;

    fn relay(transport: ScriptedTransport, max_attempts: u32) -> (RelayService, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let service = RelayService::new(
            transport.clone(),
            Arc::new(InMemoryConversationStore::new()),
            RetryPolicy::new(max_attempts, Duration::from_millis(10)),
        );
        (service, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success_records_once() {
        let (relay, transport) = relay(
            ScriptedTransport::new().failing(2, TransportError::status(503, "busy")),
            3,
        );

        let response = relay.send_message(Message::new("hello")).await.unwrap();

        assert!(response.is_success());
        assert_eq!(transport.calls(), 3);
        assert_eq!(relay.history().await.unwrap().len(), 1);
        assert_eq!(relay.stats().await.unwrap().total_requests, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_record_nothing() {
        let (relay, transport) = relay(
            ScriptedTransport::new().failing(2, TransportError::status(503, "busy")),
            2,
        );

        let result = relay.send_message(Message::new("hello")).await;

        assert!(matches!(
            result,
            Err(DomainError::RelayExhausted { attempts: 2, .. })
        ));
        assert_eq!(transport.calls(), 2);
        assert!(relay.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_terminal_rejection_is_recorded_as_error() {
        let (relay, transport) = relay(
            ScriptedTransport::new().failing(1, TransportError::status(400, "Message too long")),
            3,
        );

        let result = relay.send_message(Message::new("hello")).await;

        match result {
            Err(DomainError::InvalidRequest { message }) => assert_eq!(message, "Message too long"),
            other => panic!("expected InvalidRequest, got {:?}", other),
        }
        assert_eq!(transport.calls(), 1);

        let snapshot = relay.snapshot().await.unwrap();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].response.status, ResponseStatus::Error);
        assert_eq!(snapshot.stats.total_requests, 0);
    }

    #[tokio::test]
    async fn test_invalid_message_is_never_sent() {
        let (relay, transport) = relay(ScriptedTransport::new(), 3);

        let result = relay.send_message(Message::new("x").with_temperature(5.0)).await;

        assert!(matches!(result, Err(DomainError::InvalidRequest { .. })));
        assert_eq!(transport.calls(), 0);

        let snapshot = relay.snapshot().await.unwrap();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].response.status, ResponseStatus::Error);
        assert_eq!(snapshot.stats.total_requests, 0);
    }

    #[tokio::test]
    async fn test_local_and_remote_rejections_record_alike() {
        let message = Message::new("x").with_temperature(5.0);

        let (local, _) = relay(ScriptedTransport::new(), 3);
        let (remote, _) = relay(
            ScriptedTransport::new().failing(1, TransportError::status(400, "temperature out of range")),
            3,
        );
        let remote_message = Message::new("x");

        assert!(matches!(
            local.send_message(message.clone()).await,
            Err(DomainError::InvalidRequest { .. })
        ));
        assert!(matches!(
            remote.send_message(remote_message).await,
            Err(DomainError::InvalidRequest { .. })
        ));

        for relay in [&local, &remote] {
            let history = relay.history().await.unwrap();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].response.status, ResponseStatus::Error);
            assert_eq!(history[0].response.provider, "responder");
        }
    }

    #[tokio::test]
    async fn test_invalid_stream_message_is_recorded_once() {
        let (relay, transport) = relay(ScriptedTransport::new(), 3);

        let result = relay
            .send_message_stream(Message::new("x").with_max_tokens(0))
            .await;

        assert!(matches!(result, Err(DomainError::InvalidRequest { .. })));
        assert_eq!(transport.calls(), 0);
        assert_eq!(relay.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stats_cost_matches_history() {
        let (relay, _) = relay(ScriptedTransport::new(), 1);

        for content in ["a", "b", "c"] {
            relay.send_message(Message::new(content)).await.unwrap();
        }

        let snapshot = relay.snapshot().await.unwrap();
        let sum: f64 = snapshot
            .history
            .iter()
            .map(|e| e.response.usage.estimated_cost)
            .sum();
        assert!((snapshot.stats.total_cost - sum).abs() < 1e-9);
        assert_eq!(snapshot.stats.total_requests, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_whole_call() {
        let transport = Arc::new(ScriptedTransport::new().with_delay(Duration::from_secs(30)));
        let relay = RelayService::new(
            transport,
            Arc::new(InMemoryConversationStore::new()),
            RetryPolicy::new(3, Duration::from_millis(10))
                .with_max_elapsed(Duration::from_secs(1)),
        );

        let result = relay.send_message(Message::new("hello")).await;

        assert!(matches!(result, Err(DomainError::RelayExhausted { .. })));
        assert!(relay.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_finished_stream_is_recorded_with_end_usage() {
        let (relay, _) = relay(
            ScriptedTransport::new().with_chunks(vec![
                StreamChunk::content("Hello "),
                StreamChunk::content("world"),
                StreamChunk::end("gpt-4", Usage::priced("gpt-4", 10, 20)),
            ]),
            1,
        );

        let chunks: Vec<StreamChunk> = relay
            .send_message_stream(Message::new("hi"))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(chunks.len(), 3);

        let history = relay.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].response.response, "Hello world");
        assert_eq!(history[0].response.model, "gpt-4");
        assert_eq!(history[0].response.usage.total_tokens, 30);
    }

    #[tokio::test]
    async fn test_cut_off_stream_is_recorded_as_error() {
        let (relay, _) = relay(
            ScriptedTransport::new().with_chunks(vec![StreamChunk::content("Hel")]),
            1,
        );

        let chunks: Vec<StreamChunk> = relay
            .send_message_stream(Message::new("hi"))
            .await
            .unwrap()
            .collect()
            .await;

        assert!(matches!(chunks.last(), Some(StreamChunk::Error { .. })));

        let snapshot = relay.snapshot().await.unwrap();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].response.status, ResponseStatus::Error);
        assert_eq!(snapshot.stats.total_requests, 0);
    }

    #[tokio::test]
    async fn test_dropped_stream_records_nothing() {
        let (relay, _) = relay(
            ScriptedTransport::new().with_chunks(vec![
                StreamChunk::content("Hello "),
                StreamChunk::end("gpt-4", Usage::new(1, 1)),
            ]),
            1,
        );

        let mut chunks = relay.send_message_stream(Message::new("hi")).await.unwrap();
        assert_eq!(chunks.next().await, Some(StreamChunk::content("Hello ")));
        drop(chunks);

        assert!(relay.history().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_open_is_retried() {
        let (relay, transport) = relay(
            ScriptedTransport::new()
                .failing(1, TransportError::connect("refused"))
                .with_chunks(vec![StreamChunk::end("gpt-4", Usage::new(1, 1))]),
            2,
        );

        let chunks: Vec<StreamChunk> = relay
            .send_message_stream(Message::new("hi"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(transport.calls(), 2);
        assert_eq!(chunks.len(), 1);
    }

    #[tokio::test]
    async fn test_reporting_calls_pass_through() {
        let (relay, _) = relay(ScriptedTransport::new(), 1);

        assert_eq!(relay.check_health().await.unwrap().messages_processed, 0);
        assert_eq!(relay.list_models().await.unwrap().default, "mock-model");
        assert_eq!(relay.get_config().await.unwrap().settings.default_model, "mock-model");
    }

    #[tokio::test]
    async fn test_in_process_round_trip_with_mock_provider() {
        let provider = Arc::new(AiProvider::new(ProviderConfig::mock()));
        let responder = Arc::new(ResponderService::new(
            provider,
            ProviderConfig::mock().defaults,
        ));
        let relay = RelayService::new(
            Arc::new(InProcessTransport::new(responder.clone())),
            Arc::new(InMemoryConversationStore::new()),
            RetryPolicy::default(),
        );

        let first = relay.send_message(Message::new("What is Python?")).await.unwrap();
        let second = relay.send_message(Message::new("Explain AI")).await.unwrap();

        assert!(first.response.contains("#1"));
        assert!(second.response.contains("#2"));
        assert_eq!(responder.messages_processed(), 2);

        let stats = relay.stats().await.unwrap();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(
            stats.total_tokens,
            u64::from(first.usage.total_tokens + second.usage.total_tokens)
        );
    }
}
