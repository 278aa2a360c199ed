use serde::{Deserialize, Serialize};

use super::validation::{
    validate_content, validate_context, validate_max_tokens, validate_model, validate_temperature,
};
use crate::domain::DomainError;

/// Role of a prompt turn sent to a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

/// A single turn of the prompt handed to a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A user message with optional per-request overrides.
///
/// Any override left unset falls back to the responder's runtime settings
/// when the message is resolved into a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "message")]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, alias = "maxTokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Message {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            context: None,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Check the message and every override it carries
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_content(&self.content)?;

        if let Some(context) = &self.context {
            validate_context(context)?;
        }

        if let Some(model) = &self.model {
            validate_model(model)?;
        }

        if let Some(temperature) = self.temperature {
            validate_temperature(temperature)?;
        }

        if let Some(max_tokens) = self.max_tokens {
            validate_max_tokens(max_tokens)?;
        }

        Ok(())
    }

    /// Context with surrounding whitespace removed, `None` when blank
    pub fn effective_context(&self) -> Option<&str> {
        self.context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}
