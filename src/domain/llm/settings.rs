//! Provider selection and runtime generation settings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::{validate_max_tokens, validate_model, validate_temperature};
use crate::domain::DomainError;

/// The backend family a responder talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Mock,
    OpenAi,
    Bedrock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::OpenAi => "openai",
            Self::Bedrock => "bedrock",
        }
    }

    /// Model used when neither the message nor the runtime settings name one
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Mock => "mock-model",
            Self::OpenAi => "gpt-4",
            Self::Bedrock => "anthropic.claude-3-haiku-20240307-v1:0",
        }
    }

    /// Models advertised for this backend family
    pub fn known_models(&self) -> &'static [&'static str] {
        match self {
            Self::Mock => &["mock-model"],
            Self::OpenAi => &[
                "gpt-4",
                "gpt-4-turbo",
                "gpt-4o",
                "gpt-4o-mini",
                "gpt-3.5-turbo",
            ],
            Self::Bedrock => &[
                "anthropic.claude-3-5-sonnet-20241022-v2:0",
                "anthropic.claude-3-5-sonnet-20240620-v1:0",
                "anthropic.claude-3-5-haiku-20241022-v1:0",
                "anthropic.claude-3-sonnet-20240229-v1:0",
                "anthropic.claude-3-haiku-20240307-v1:0",
                "anthropic.claude-3-opus-20240229-v1:0",
            ],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "bedrock" | "aws" => Ok(Self::Bedrock),
            other => Err(DomainError::invalid_config(format!(
                "Unknown provider '{}': expected mock, openai or bedrock",
                other
            ))),
        }
    }
}

/// Mutable defaults applied to messages that do not override them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub default_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationSettings {
    pub fn new(default_model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            default_model: default_model.into(),
            temperature,
            max_tokens,
        }
    }

    pub fn for_provider(kind: ProviderKind) -> Self {
        Self {
            default_model: kind.default_model().to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_model(&self.default_model)
            .and_then(|_| validate_temperature(self.temperature))
            .and_then(|_| validate_max_tokens(self.max_tokens))
            .map_err(|e| DomainError::invalid_config(e.to_string()))
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            default_model: ProviderKind::Mock.default_model().to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// Partial update of the runtime settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(default, alias = "model", skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, alias = "max_tokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.default_model.is_none() && self.temperature.is_none() && self.max_tokens.is_none()
    }

    /// Produce the updated settings, or an error without touching anything
    /// if any single field is out of range.
    pub fn apply_to(&self, settings: &GenerationSettings) -> Result<GenerationSettings, DomainError> {
        let updated = GenerationSettings {
            default_model: self
                .default_model
                .clone()
                .unwrap_or_else(|| settings.default_model.clone()),
            temperature: self.temperature.unwrap_or(settings.temperature),
            max_tokens: self.max_tokens.unwrap_or(settings.max_tokens),
        };

        updated.validate()?;
        Ok(updated)
    }
}

/// Runtime settings as reported by a responder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    pub provider: ProviderKind,
    #[serde(flatten)]
    pub settings: GenerationSettings,
}

impl ProviderSettings {
    pub fn new(provider: ProviderKind, settings: GenerationSettings) -> Self {
        Self { provider, settings }
    }
}
