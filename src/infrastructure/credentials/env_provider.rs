use async_trait::async_trait;
use std::collections::HashMap;
use std::env;

use crate::domain::{Credential, CredentialProvider, DomainError, ProviderKind};

/// Environment variables backing one provider kind
#[derive(Debug, Clone)]
pub struct EnvMapping {
    /// Candidates for the secret, first set one wins
    pub secret_vars: Vec<String>,
    pub additional_vars: HashMap<String, String>,
}

impl EnvMapping {
    pub fn new(secret_var: impl Into<String>) -> Self {
        Self {
            secret_vars: vec![secret_var.into()],
            additional_vars: HashMap::new(),
        }
    }

    pub fn or_var(mut self, secret_var: impl Into<String>) -> Self {
        self.secret_vars.push(secret_var.into());
        self
    }

    pub fn with_var(mut self, param_name: impl Into<String>, env_var: impl Into<String>) -> Self {
        self.additional_vars.insert(param_name.into(), env_var.into());
        self
    }
}

/// Credential provider that reads from environment variables
#[derive(Debug)]
pub struct EnvCredentialProvider {
    mappings: HashMap<ProviderKind, EnvMapping>,
}

impl EnvCredentialProvider {
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
        }
    }

    pub fn with_mapping(mut self, provider: ProviderKind, mapping: EnvMapping) -> Self {
        self.mappings.insert(provider, mapping);
        self
    }

    pub fn with_defaults(mut self) -> Self {
        self.mappings
            .insert(ProviderKind::OpenAi, EnvMapping::new("OPENAI_API_KEY"));

        self.mappings.insert(
            ProviderKind::Bedrock,
            EnvMapping::new("AWS_ACCESS_KEY_ID")
                .or_var("AWS_PROFILE")
                .or_var("AWS_ROLE_ARN")
                .with_var("region", "AWS_REGION"),
        );

        self
    }

    fn read_credential(&self, provider: ProviderKind) -> Result<Credential, DomainError> {
        let mapping = self.mappings.get(&provider).ok_or_else(|| {
            DomainError::backend_unavailable(
                provider.as_str(),
                "No environment mapping for this provider",
            )
        })?;

        let secret = mapping
            .secret_vars
            .iter()
            .find_map(|var| env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| {
                DomainError::backend_unavailable(
                    provider.as_str(),
                    format!("Credentials not configured: set {}", mapping.secret_vars.join(", ")),
                )
            })?;

        let mut credential = Credential::new(provider, secret);

        for (param_name, env_var) in &mapping.additional_vars {
            if let Ok(value) = env::var(env_var) {
                credential = credential.with_param(param_name, value);
            }
        }

        Ok(credential)
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new().with_defaults()
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn get_credential(&self, provider: ProviderKind) -> Result<Credential, DomainError> {
        self.read_credential(provider)
    }

    fn provider_name(&self) -> &'static str {
        "env"
    }
}
