use serde::{Deserialize, Serialize};

use super::validation::validate_model;
use super::{GenerationSettings, Message, MessageRole, PromptMessage};
use crate::domain::DomainError;

/// System turn used when a message carries no context
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// A fully resolved request for a backend: every parameter has a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<PromptMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Resolve a message against the runtime settings.
    ///
    /// Unset overrides take the runtime value. The context, when present,
    /// becomes the system turn.
    pub fn resolve(message: &Message, settings: &GenerationSettings) -> Result<Self, DomainError> {
        let model = message
            .model
            .clone()
            .unwrap_or_else(|| settings.default_model.clone());
        validate_model(&model)?;

        let system = message.effective_context().unwrap_or(DEFAULT_SYSTEM_PROMPT);

        Ok(Self {
            model,
            messages: vec![
                PromptMessage::system(system),
                PromptMessage::user(message.content.clone()),
            ],
            temperature: message.temperature.unwrap_or(settings.temperature),
            max_tokens: message.max_tokens.unwrap_or(settings.max_tokens),
        })
    }

    pub fn builder() -> CompletionRequestBuilder {
        CompletionRequestBuilder::new()
    }

    /// Concatenated system turns, if any
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Text of the last user turn
    pub fn user_prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// Builder for CompletionRequest
#[derive(Debug)]
pub struct CompletionRequestBuilder {
    model: String,
    messages: Vec<PromptMessage>,
    temperature: f32,
    max_tokens: u32,
}

impl Default for CompletionRequestBuilder {
    fn default() -> Self {
        let settings = GenerationSettings::default();
        Self {
            model: settings.default_model,
            messages: Vec::new(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

impl CompletionRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(PromptMessage::system(content));
        self
    }

    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(PromptMessage::user(content));
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn build(self) -> CompletionRequest {
        CompletionRequest {
            model: self.model,
            messages: self.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}
