//! Provider capability: one lazily built backend plus pricing and timing

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use futures::{stream, StreamExt};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::factory::{BackendFactory, ConfiguredBackendFactory};
use crate::domain::usage::approximate_tokens;
use crate::domain::{
    AiResponse, ChunkStream, CompletionDelta, CompletionRequest, DeltaStream, DomainError,
    GenerationSettings, LlmBackend, Message, ProviderConfig, ProviderHealth, ProviderKind,
    StreamChunk, Usage,
};
use crate::infrastructure::observability::record_provider_request;

/// Front for one configured backend.
///
/// The backend client is built on first use. Concurrent first callers wait
/// on the same construction; a failed construction is not cached, so the
/// next call tries again.
#[derive(Debug)]
pub struct AiProvider {
    kind: ProviderKind,
    configured: bool,
    factory: Arc<dyn BackendFactory>,
    backend: OnceCell<Arc<dyn LlmBackend>>,
}

impl AiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let kind = config.kind;
        let configured = config.is_configured();
        Self::with_factory(kind, configured, Arc::new(ConfiguredBackendFactory::new(config)))
    }

    pub fn with_factory(kind: ProviderKind, configured: bool, factory: Arc<dyn BackendFactory>) -> Self {
        Self {
            kind,
            configured,
            factory,
            backend: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    async fn backend(&self) -> Result<Arc<dyn LlmBackend>, DomainError> {
        self.backend
            .get_or_try_init(|| async {
                info!(provider = %self.kind, "Initializing AI backend");
                let backend = self.factory.create().await;
                if let Err(ref e) = backend {
                    warn!(provider = %self.kind, error = %e, "AI backend initialization failed");
                }
                backend
            })
            .await
            .cloned()
    }

    /// Answer a message in one piece
    pub async fn process(
        &self,
        message: &Message,
        settings: &GenerationSettings,
    ) -> Result<AiResponse, DomainError> {
        let request = CompletionRequest::resolve(message, settings)?;
        let backend = self.backend().await?;

        let started = Instant::now();
        let result = backend.chat(&request).await;
        let elapsed = started.elapsed();

        let completion = match result {
            Ok(completion) => completion,
            Err(e) => {
                record_provider_request(self.kind.as_str(), &request.model, false, elapsed, 0);
                warn!(provider = %self.kind, model = %request.model, error = %e, "Backend call failed");
                return Err(e);
            }
        };

        let (prompt_tokens, completion_tokens) =
            if completion.prompt_tokens == 0 && completion.completion_tokens == 0 {
                (
                    approximate_tokens(request.user_prompt()),
                    approximate_tokens(&completion.content),
                )
            } else {
                (completion.prompt_tokens, completion.completion_tokens)
            };

        if let Err(e) = check_token_counts(self.kind, prompt_tokens, completion_tokens) {
            record_provider_request(self.kind.as_str(), &request.model, false, elapsed, 0);
            warn!(provider = %self.kind, model = %request.model, error = %e, "Backend reported unusable usage");
            return Err(e);
        }

        let usage = Usage::priced(&request.model, prompt_tokens, completion_tokens);
        record_provider_request(
            self.kind.as_str(),
            &request.model,
            true,
            elapsed,
            usage.total_tokens,
        );

        if !usage.cost_known {
            debug!(model = %request.model, "No pricing for model, cost reported as 0");
        }

        Ok(AiResponse::success(
            self.kind.as_str(),
            request.model,
            completion.content,
            usage,
            elapsed,
        ))
    }

    /// Answer a message incrementally.
    ///
    /// The returned stream always ends with exactly one `End` or `Error` chunk.
    pub async fn stream(
        &self,
        message: &Message,
        settings: &GenerationSettings,
    ) -> Result<ChunkStream, DomainError> {
        let request = CompletionRequest::resolve(message, settings)?;
        let backend = self.backend().await?;

        let started = Instant::now();
        let deltas = match backend.chat_stream(&request).await {
            Ok(deltas) => deltas,
            Err(e) => {
                record_provider_request(self.kind.as_str(), &request.model, false, started.elapsed(), 0);
                return Err(e);
            }
        };

        let state = StreamState {
            deltas,
            provider: self.kind,
            prompt: request.user_prompt().to_string(),
            model: request.model,
            text: String::new(),
            reported: None,
            started,
            finished: false,
        };

        Ok(Box::pin(stream::unfold(state, StreamState::next_chunk)))
    }

    /// Report whether credentials are present and the backend answers
    pub async fn health_check(&self) -> ProviderHealth {
        if !self.configured {
            return ProviderHealth::degraded(false, "Credentials not configured");
        }

        let backend = match self.backend().await {
            Ok(backend) => backend,
            Err(e) => return ProviderHealth::degraded(true, e.to_string()),
        };

        match backend.health_check().await {
            Ok(()) => ProviderHealth::healthy(true),
            Err(e) => ProviderHealth::unreachable(true, e.to_string()),
        }
    }

    /// Models known for this provider kind
    pub fn list_models(&self) -> BTreeSet<String> {
        self.kind
            .known_models()
            .iter()
            .map(|m| m.to_string())
            .collect()
    }
}

/// Backend counts whose total does not fit the usage type are rejected
fn check_token_counts(
    provider: ProviderKind,
    prompt_tokens: u32,
    completion_tokens: u32,
) -> Result<(), DomainError> {
    match prompt_tokens.checked_add(completion_tokens) {
        Some(_) => Ok(()),
        None => Err(DomainError::backend_error(
            provider.as_str(),
            format!("Reported token usage overflows: {prompt_tokens} + {completion_tokens}"),
        )),
    }
}

struct StreamState {
    deltas: DeltaStream,
    provider: ProviderKind,
    model: String,
    prompt: String,
    text: String,
    reported: Option<(u32, u32)>,
    started: Instant,
    finished: bool,
}

impl StreamState {
    async fn next_chunk(mut self) -> Option<(StreamChunk, Self)> {
        if self.finished {
            return None;
        }

        loop {
            match self.deltas.next().await {
                Some(Ok(CompletionDelta::Text(text))) => {
                    self.text.push_str(&text);
                    return Some((StreamChunk::content(text), self));
                }
                Some(Ok(CompletionDelta::Usage {
                    prompt_tokens,
                    completion_tokens,
                })) => {
                    self.reported = Some((prompt_tokens, completion_tokens));
                }
                Some(Ok(CompletionDelta::Finished)) => {
                    let chunk = match self.reported {
                        Some((prompt, completion)) => {
                            match check_token_counts(self.provider, prompt, completion) {
                                Ok(()) => self.end_chunk(),
                                Err(e) => self.fail(e.to_string()),
                            }
                        }
                        None => self.end_chunk(),
                    };
                    return Some((chunk, self));
                }
                Some(Err(e)) => {
                    let chunk = self.fail(e.to_string());
                    return Some((chunk, self));
                }
                None => {
                    let chunk = self.fail("Backend stream ended before completion".to_string());
                    return Some((chunk, self));
                }
            }
        }
    }

    fn end_chunk(&mut self) -> StreamChunk {
        self.finished = true;

        let (prompt_tokens, completion_tokens) = self.reported.unwrap_or_else(|| {
            (
                approximate_tokens(&self.prompt),
                approximate_tokens(&self.text),
            )
        });
        let usage = Usage::priced(&self.model, prompt_tokens, completion_tokens);

        record_provider_request(
            self.provider.as_str(),
            &self.model,
            true,
            self.started.elapsed(),
            usage.total_tokens,
        );

        StreamChunk::end(self.model.clone(), usage)
    }

    fn fail(&mut self, message: String) -> StreamChunk {
        self.finished = true;

        warn!(provider = %self.provider, model = %self.model, error = %message, "Backend stream failed");
        record_provider_request(self.provider.as_str(), &self.model, false, self.started.elapsed(), 0);

        StreamChunk::error(message)
    }
}
