use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::bedrock::{BedrockBackend, BedrockClient};
use super::http_client::HttpClient;
use super::mock::MockBackend;
use super::openai::OpenAiBackend;
use crate::domain::{Credential, DomainError, LlmBackend, ProviderConfig, ProviderKind};

/// Bound on a JSON call or on opening a stream; streamed bodies are unbounded
const BACKEND_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Builds the backend client on first use
#[async_trait]
pub trait BackendFactory: Send + Sync + std::fmt::Debug {
    async fn create(&self) -> Result<Arc<dyn LlmBackend>, DomainError>;
}

/// Factory for creating LLM backends
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create a backend from configuration.
    ///
    /// Fails with `BackendUnavailable` when the credential the backend
    /// needs is missing or the client cannot be built.
    pub async fn create(config: &ProviderConfig) -> Result<Arc<dyn LlmBackend>, DomainError> {
        match config.kind {
            ProviderKind::Mock => Ok(Self::create_mock(config.mock_delay)),

            ProviderKind::OpenAi => {
                let credential = Self::require_credential(config, "OPENAI_API_KEY")?;
                match config.base_url {
                    Some(ref base_url) => {
                        Self::create_openai_with_base_url(credential.secret(), base_url)
                    }
                    None => Self::create_openai(credential.secret()),
                }
            }

            ProviderKind::Bedrock => {
                Self::require_credential(config, "AWS_ACCESS_KEY_ID, AWS_PROFILE or AWS_ROLE_ARN")?;
                Ok(Self::create_bedrock_async(config.region.as_deref()).await)
            }
        }
    }

    pub fn create_mock(delay: Duration) -> Arc<dyn LlmBackend> {
        Arc::new(MockBackend::new().with_delay(delay))
    }

    /// Create an OpenAI backend directly
    pub fn create_openai(api_key: impl Into<String>) -> Result<Arc<dyn LlmBackend>, DomainError> {
        let client = HttpClient::with_timeout("openai", BACKEND_REQUEST_TIMEOUT)?;
        Ok(Arc::new(OpenAiBackend::new(client, api_key)))
    }

    /// Create an OpenAI backend with custom base URL
    pub fn create_openai_with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Arc<dyn LlmBackend>, DomainError> {
        let client = HttpClient::with_timeout("openai", BACKEND_REQUEST_TIMEOUT)?;
        Ok(Arc::new(OpenAiBackend::with_base_url(client, api_key, base_url)))
    }

    /// Create an AWS Bedrock backend
    pub async fn create_bedrock_async(region: Option<&str>) -> Arc<dyn LlmBackend> {
        let config = if let Some(region) = region {
            aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(region.to_string()))
                .load()
                .await
        } else {
            aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await
        };

        Arc::new(BedrockBackend::new(BedrockClient::new(&config)))
    }

    fn require_credential<'a>(
        config: &'a ProviderConfig,
        source: &str,
    ) -> Result<&'a Credential, DomainError> {
        config
            .credential
            .as_ref()
            .filter(|c| c.provider() == config.kind && !c.secret().is_empty())
            .ok_or_else(|| {
                DomainError::backend_unavailable(
                    config.kind.as_str(),
                    format!("Credentials not configured: set {}", source),
                )
            })
    }
}

/// Builds backends from a fixed `ProviderConfig`
#[derive(Debug, Clone)]
pub struct ConfiguredBackendFactory {
    config: ProviderConfig,
}

impl ConfiguredBackendFactory {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BackendFactory for ConfiguredBackendFactory {
    async fn create(&self) -> Result<Arc<dyn LlmBackend>, DomainError> {
        LlmProviderFactory::create(&self.config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_mock_backend() {
        let backend = LlmProviderFactory::create(&ProviderConfig::mock()).await.unwrap();
        assert_eq!(backend.provider_name(), "mock");
    }

    #[tokio::test]
    async fn test_create_openai_backend() {
        let config = ProviderConfig::new(ProviderKind::OpenAi)
            .with_credential(Credential::new(ProviderKind::OpenAi, "sk-test"));

        let backend = LlmProviderFactory::create(&config).await.unwrap();
        assert_eq!(backend.provider_name(), "openai");
    }

    #[tokio::test]
    async fn test_openai_without_key_is_unavailable() {
        let config = ProviderConfig::new(ProviderKind::OpenAi);

        let result = LlmProviderFactory::create(&config).await;
        match result {
            Err(DomainError::BackendUnavailable { provider, message }) => {
                assert_eq!(provider, "openai");
                assert!(message.contains("OPENAI_API_KEY"));
            }
            other => panic!("expected BackendUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bedrock_without_aws_identity_is_unavailable() {
        let config = ProviderConfig::new(ProviderKind::Bedrock).with_region("us-east-1");

        let result = LlmProviderFactory::create(&config).await;
        assert!(matches!(result, Err(DomainError::BackendUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_configured_factory() {
        let factory = ConfiguredBackendFactory::new(ProviderConfig::mock());
        let backend = factory.create().await.unwrap();
        assert_eq!(backend.provider_name(), "mock");
    }
}
