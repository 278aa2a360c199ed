//! Offline backend that echoes the message back

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt};

use crate::domain::usage::approximate_tokens;
use crate::domain::{Completion, CompletionDelta, CompletionRequest, DeltaStream, DomainError, LlmBackend};

/// Deterministic backend that never touches the network.
///
/// Every call, streamed or not, takes the next value of one shared counter,
/// so responses are tagged `#1`, `#2`, ... in call order.
#[derive(Debug, Default)]
pub struct MockBackend {
    counter: AtomicU64,
    delay: Duration,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate backend latency; streams pause this long between words
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn next_sequence(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn calls(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

pub fn mock_response_text(sequence: u64, message: &str) -> String {
    format!(
        "[MOCK RESPONSE #{}] You said: '{}'. This is a test response without calling any external API.",
        sequence, message
    )
}

pub fn mock_stream_text(sequence: u64, message: &str) -> String {
    format!(
        "[MOCK STREAM #{}] You said: '{}'. This is a streaming test response.",
        sequence, message
    )
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn chat(&self, request: &CompletionRequest) -> Result<Completion, DomainError> {
        let sequence = self.next_sequence();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let prompt = request.user_prompt();
        let content = mock_response_text(sequence, prompt);
        let prompt_tokens = approximate_tokens(prompt);
        let completion_tokens = approximate_tokens(&content);

        Ok(Completion::new(&request.model, content).with_usage(prompt_tokens, completion_tokens))
    }

    async fn chat_stream(&self, request: &CompletionRequest) -> Result<DeltaStream, DomainError> {
        let sequence = self.next_sequence();

        let prompt = request.user_prompt();
        let content = mock_stream_text(sequence, prompt);
        let usage = CompletionDelta::Usage {
            prompt_tokens: approximate_tokens(prompt),
            completion_tokens: approximate_tokens(&content),
        };

        let words: Vec<String> = content
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();

        let delay = self.delay;
        let text = stream::iter(words).then(move |word| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok::<_, DomainError>(CompletionDelta::Text(word))
        });
        let tail = stream::iter([Ok(usage), Ok(CompletionDelta::Finished)]);

        Ok(Box::pin(text.chain(tail)))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
