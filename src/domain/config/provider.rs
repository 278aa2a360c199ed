use std::time::Duration;

use crate::domain::credentials::Credential;
use crate::domain::llm::{GenerationSettings, ProviderKind};
use crate::domain::DomainError;

/// Everything needed to build and drive one backend.
///
/// Fixed for the life of the process, except `defaults`, which seeds the
/// responder's runtime settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub defaults: GenerationSettings,
    pub credential: Option<Credential>,
    /// Override for the backend endpoint (OpenAI-compatible servers, tests)
    pub base_url: Option<String>,
    /// AWS region for Bedrock
    pub region: Option<String>,
    /// Artificial latency of the mock backend
    pub mock_delay: Duration,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            defaults: GenerationSettings::for_provider(kind),
            credential: None,
            base_url: None,
            region: None,
            mock_delay: Duration::ZERO,
        }
    }

    pub fn mock() -> Self {
        Self::new(ProviderKind::Mock)
    }

    pub fn with_defaults(mut self, defaults: GenerationSettings) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_mock_delay(mut self, delay: Duration) -> Self {
        self.mock_delay = delay;
        self
    }

    /// Whether the credentials this backend needs are present
    pub fn is_configured(&self) -> bool {
        match self.kind {
            ProviderKind::Mock => true,
            ProviderKind::OpenAi | ProviderKind::Bedrock => self
                .credential
                .as_ref()
                .is_some_and(|c| c.provider() == self.kind && !c.secret().is_empty()),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.defaults.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_is_always_configured() {
        assert!(ProviderConfig::mock().is_configured());
    }

    #[test]
    fn test_remote_backends_need_credentials() {
        let config = ProviderConfig::new(ProviderKind::OpenAi);
        assert!(!config.is_configured());
        assert_eq!(config.defaults.default_model, "gpt-4");

        let config = config.with_credential(Credential::new(ProviderKind::OpenAi, "sk-test"));
        assert!(config.is_configured());
    }

    #[test]
    fn test_credential_for_other_backend_does_not_count() {
        let config = ProviderConfig::new(ProviderKind::Bedrock)
            .with_credential(Credential::new(ProviderKind::OpenAi, "sk-test"));
        assert!(!config.is_configured());
    }

    #[test]
    fn test_validate_rejects_bad_defaults() {
        let config = ProviderConfig::mock()
            .with_defaults(GenerationSettings::new("mock-model", 9.0, 100));
        assert!(matches!(
            config.validate(),
            Err(DomainError::InvalidConfig { .. })
        ));
    }
}
