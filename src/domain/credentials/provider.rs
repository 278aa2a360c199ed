use async_trait::async_trait;
use std::fmt::Debug;

use super::Credential;
use crate::domain::llm::ProviderKind;
use crate::domain::DomainError;

/// Source of backend credentials (environment, test fixtures)
#[async_trait]
pub trait CredentialProvider: Send + Sync + Debug {
    /// Get the credential for a backend family.
    ///
    /// Fails with `BackendUnavailable` when the material is absent.
    async fn get_credential(&self, provider: ProviderKind) -> Result<Credential, DomainError>;

    /// Get provider name for logging/debugging
    fn provider_name(&self) -> &'static str;
}
