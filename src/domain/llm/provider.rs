use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::pin::Pin;

use super::response::{Completion, CompletionDelta, StreamChunk};
use super::CompletionRequest;
use crate::domain::DomainError;

/// Stream of backend events for one streaming call
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<CompletionDelta, DomainError>> + Send>>;

/// Stream of consumer-facing chunks; failures arrive in-band as `StreamChunk::Error`
pub type ChunkStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// A concrete AI backend (mock, OpenAI, Bedrock)
#[async_trait]
pub trait LlmBackend: Send + Sync + Debug {
    /// Produce a complete answer for the request
    async fn chat(&self, request: &CompletionRequest) -> Result<Completion, DomainError>;

    /// Produce the answer incrementally
    async fn chat_stream(&self, request: &CompletionRequest) -> Result<DeltaStream, DomainError>;

    /// Lightweight reachability probe. Backends without a cheap no-op call
    /// report healthy as soon as they are constructed.
    async fn health_check(&self) -> Result<(), DomainError> {
        Ok(())
    }

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use futures::stream;

    /// Backend returning canned answers, for service-level tests
    #[derive(Debug, Default)]
    pub struct ScriptedBackend {
        content: Option<String>,
        usage: Option<(u32, u32)>,
        error: Option<String>,
        stream_events: Option<Vec<Result<CompletionDelta, DomainError>>>,
        health_error: Option<String>,
    }

    impl ScriptedBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_content(mut self, content: impl Into<String>) -> Self {
            self.content = Some(content.into());
            self
        }

        pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
            self.usage = Some((prompt_tokens, completion_tokens));
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn with_stream(mut self, events: Vec<Result<CompletionDelta, DomainError>>) -> Self {
            self.stream_events = Some(events);
            self
        }

        pub fn with_health_error(mut self, error: impl Into<String>) -> Self {
            self.health_error = Some(error.into());
            self
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn chat(&self, request: &CompletionRequest) -> Result<Completion, DomainError> {
            if let Some(ref error) = self.error {
                return Err(DomainError::backend_error("scripted", error));
            }

            let content = self.content.clone().unwrap_or_default();
            let (prompt, completion) = self.usage.unwrap_or((0, 0));
            Ok(Completion::new(&request.model, content).with_usage(prompt, completion))
        }

        async fn chat_stream(
            &self,
            request: &CompletionRequest,
        ) -> Result<DeltaStream, DomainError> {
            if let Some(ref events) = self.stream_events {
                return Ok(Box::pin(stream::iter(events.clone())));
            }

            let completion = self.chat(request).await?;
            let mut events: Vec<Result<CompletionDelta, DomainError>> = completion
                .content
                .split_inclusive(' ')
                .map(|word| Ok(CompletionDelta::Text(word.to_string())))
                .collect();
            if let Some((prompt_tokens, completion_tokens)) = self.usage {
                events.push(Ok(CompletionDelta::Usage {
                    prompt_tokens,
                    completion_tokens,
                }));
            }
            events.push(Ok(CompletionDelta::Finished));

            Ok(Box::pin(stream::iter(events)))
        }

        async fn health_check(&self) -> Result<(), DomainError> {
            match self.health_error {
                Some(ref error) => Err(DomainError::backend_error("scripted", error)),
                None => Ok(()),
            }
        }

        fn provider_name(&self) -> &'static str {
            "scripted"
        }
    }
}
