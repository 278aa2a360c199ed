use std::collections::HashMap;
use std::fmt;

use crate::domain::llm::ProviderKind;

/// Secret material a backend needs to authenticate.
///
/// For OpenAI the secret is the API key. For Bedrock it names whichever AWS
/// identity source was found (access key ID, profile or role ARN); the SDK
/// resolves the actual signing credentials itself.
#[derive(Clone)]
pub struct Credential {
    provider: ProviderKind,
    secret: String,
    params: HashMap<String, String>,
}

impl Credential {
    pub fn new(provider: ProviderKind, secret: impl Into<String>) -> Self {
        Self {
            provider,
            secret: secret.into(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn get_param(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("secret", &"[REDACTED]")
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .finish()
    }
}
