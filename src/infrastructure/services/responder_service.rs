//! Responder service - the server half that answers messages with a provider

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::domain::{
    AiResponse, ChunkStream, ConfigOverrides, DomainError, GenerationSettings, Message,
    ModelCatalog, ProviderSettings, ResponderHealth,
};
use crate::infrastructure::llm::AiProvider;

/// Holds the provider capability, its current defaults and a request counter
#[derive(Debug)]
pub struct ResponderService {
    provider: Arc<AiProvider>,
    settings: RwLock<GenerationSettings>,
    messages_processed: AtomicU64,
}

impl ResponderService {
    pub fn new(provider: Arc<AiProvider>, settings: GenerationSettings) -> Self {
        Self {
            provider,
            settings: RwLock::new(settings),
            messages_processed: AtomicU64::new(0),
        }
    }

    /// Answer a message in one piece
    pub async fn process(&self, message: &Message) -> Result<AiResponse, DomainError> {
        message.validate()?;
        let sequence = self.receive();
        let settings = self.current_settings()?;

        debug!(request = sequence, model = ?message.model, "Processing message");
        self.provider.process(message, &settings).await
    }

    /// Answer a message as a chunk stream ending in `End` or `Error`
    pub async fn stream(&self, message: &Message) -> Result<ChunkStream, DomainError> {
        message.validate()?;
        let sequence = self.receive();
        let settings = self.current_settings()?;

        debug!(request = sequence, model = ?message.model, "Streaming message");
        self.provider.stream(message, &settings).await
    }

    /// Service status including the provider's health
    pub async fn health(&self) -> ResponderHealth {
        let ai = self.provider.health_check().await;
        ResponderHealth::new(self.provider.kind(), self.messages_processed(), ai)
    }

    /// Models the configured provider knows, plus the current default
    pub fn list_models(&self) -> Result<ModelCatalog, DomainError> {
        Ok(ModelCatalog {
            provider: self.provider.kind(),
            models: self.provider.list_models(),
            default: self.current_settings()?.default_model,
        })
    }

    pub fn get_config(&self) -> Result<ProviderSettings, DomainError> {
        Ok(ProviderSettings::new(
            self.provider.kind(),
            self.current_settings()?,
        ))
    }

    /// Apply partial overrides. Nothing changes unless every field is valid.
    pub fn reconfigure(&self, overrides: &ConfigOverrides) -> Result<ProviderSettings, DomainError> {
        let mut settings = self
            .settings
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?;

        let updated = overrides.apply_to(&settings)?;
        *settings = updated.clone();

        info!(
            model = %updated.default_model,
            temperature = updated.temperature,
            max_tokens = updated.max_tokens,
            "Responder configuration updated"
        );

        Ok(ProviderSettings::new(self.provider.kind(), updated))
    }

    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::SeqCst)
    }

    fn receive(&self) -> u64 {
        self.messages_processed.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_settings(&self) -> Result<GenerationSettings, DomainError> {
        self.settings
            .read()
            .map(|s| s.clone())
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HealthStatus, ProviderConfig, ProviderKind, StreamChunk};
    use futures::StreamExt;

    fn mock_service() -> ResponderService {
        ResponderService::new(
            Arc::new(AiProvider::new(ProviderConfig::mock())),
            GenerationSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_mock_responses_are_numbered_across_calls() {
        let service = mock_service();

        let first = service.process(&Message::new("What is Python?")).await.unwrap();
        let second = service.process(&Message::new("Explain AI")).await.unwrap();

        assert!(first.response.contains("#1"));
        assert!(second.response.contains("#2"));
        assert_eq!(service.messages_processed(), 2);
    }

    #[tokio::test]
    async fn test_mock_usage_totals_add_up() {
        let service = mock_service();

        let response = service
            .process(&Message::new("count my tokens please"))
            .await
            .unwrap();

        assert_eq!(
            response.usage.total_tokens,
            response.usage.prompt_tokens + response.usage.completion_tokens
        );
    }

    #[tokio::test]
    async fn test_unknown_model_has_zero_cost() {
        let service = mock_service();

        let response = service
            .process(&Message::new("hi").with_model("no-such-model"))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.model, "no-such-model");
        assert_eq!(response.usage.estimated_cost, 0.0);
        assert!(!response.usage.cost_known);
    }

    #[tokio::test]
    async fn test_invalid_message_is_rejected_and_not_counted() {
        let service = mock_service();

        let result = service.process(&Message::new("   ")).await;

        assert!(matches!(result, Err(DomainError::InvalidRequest { .. })));
        assert_eq!(service.messages_processed(), 0);
    }

    #[tokio::test]
    async fn test_stream_counts_and_ends() {
        let service = mock_service();

        let chunks: Vec<StreamChunk> = service
            .stream(&Message::new("stream this"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(service.messages_processed(), 1);
        assert!(matches!(chunks.last(), Some(StreamChunk::End { .. })));
    }

    #[test]
    fn test_get_config_is_idempotent() {
        let service = mock_service();

        let first = service.get_config().unwrap();
        let second = service.get_config().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.provider, ProviderKind::Mock);
    }

    #[test]
    fn test_reconfigure_out_of_range_changes_nothing() {
        let service = mock_service();
        let before = service.get_config().unwrap();

        let overrides = ConfigOverrides {
            default_model: Some("other-model".to_string()),
            temperature: Some(3.5),
            max_tokens: None,
        };
        let result = service.reconfigure(&overrides);

        assert!(matches!(result, Err(DomainError::InvalidConfig { .. })));
        assert_eq!(service.get_config().unwrap(), before);
    }

    #[test]
    fn test_reconfigure_applies_partial_overrides() {
        let service = mock_service();

        let overrides = ConfigOverrides {
            default_model: None,
            temperature: Some(0.2),
            max_tokens: Some(256),
        };
        let updated = service.reconfigure(&overrides).unwrap();

        assert_eq!(updated.settings.default_model, "mock-model");
        assert_eq!(updated.settings.temperature, 0.2);
        assert_eq!(updated.settings.max_tokens, 256);
        assert_eq!(service.get_config().unwrap(), updated);
    }

    #[test]
    fn test_list_models_reports_current_default() {
        let service = mock_service();

        let catalog = service.list_models().unwrap();

        assert_eq!(catalog.provider, ProviderKind::Mock);
        assert!(catalog.models.contains("mock-model"));
        assert_eq!(catalog.default, "mock-model");
    }

    #[tokio::test]
    async fn test_health_reports_processed_count() {
        let service = mock_service();
        service.process(&Message::new("hello")).await.unwrap();

        let health = service.health().await;

        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.messages_processed, 1);
        assert!(health.ai.configured);
    }

    #[tokio::test]
    async fn test_unconfigured_remote_provider_is_degraded() {
        let service = ResponderService::new(
            Arc::new(AiProvider::new(ProviderConfig::new(ProviderKind::OpenAi))),
            GenerationSettings::for_provider(ProviderKind::OpenAi),
        );

        let health = service.health().await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert!(!health.ai.configured);

        let result = service.process(&Message::new("hello")).await;
        assert!(matches!(result, Err(DomainError::BackendUnavailable { .. })));
    }
}
