use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::usage::estimate_cost;

/// Token usage and the cost estimate derived from it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub estimated_cost: f64,
    #[serde(default = "default_cost_known")]
    pub cost_known: bool,
}

fn default_cost_known() -> bool {
    true
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
            estimated_cost: 0.0,
            cost_known: true,
        }
    }

    /// Usage with the cost estimated for `model`
    pub fn priced(model: &str, prompt_tokens: u32, completion_tokens: u32) -> Self {
        let estimate = estimate_cost(model, prompt_tokens, completion_tokens);
        Self {
            estimated_cost: estimate.cost,
            cost_known: estimate.known,
            ..Self::new(prompt_tokens, completion_tokens)
        }
    }
}

/// Outcome of processing a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// The result of processing one message.
///
/// On error, `response` holds the failure reason and usage is zeroed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    pub status: ResponseStatus,
    #[serde(rename = "aiResponse")]
    pub response: String,
    pub model: String,
    pub provider: String,
    pub usage: Usage,
    pub timestamp: DateTime<Utc>,
    /// Seconds spent producing the response
    pub processing_time: f64,
}

impl AiResponse {
    pub fn success(
        provider: impl Into<String>,
        model: impl Into<String>,
        response: impl Into<String>,
        usage: Usage,
        elapsed: Duration,
    ) -> Self {
        Self {
            status: ResponseStatus::Success,
            response: response.into(),
            model: model.into(),
            provider: provider.into(),
            usage,
            timestamp: Utc::now(),
            processing_time: round_seconds(elapsed),
        }
    }

    pub fn error(
        provider: impl Into<String>,
        model: impl Into<String>,
        reason: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            status: ResponseStatus::Error,
            response: reason.into(),
            model: model.into(),
            provider: provider.into(),
            usage: Usage::default(),
            timestamp: Utc::now(),
            processing_time: round_seconds(elapsed),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

fn round_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

/// Raw output of a backend call, before pricing
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub model: String,
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Completion {
    pub fn new(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            content: content.into(),
            prompt_tokens: 0,
            completion_tokens: 0,
        }
    }

    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.prompt_tokens = prompt_tokens;
        self.completion_tokens = completion_tokens;
        self
    }
}

/// Incremental event produced by a streaming backend call
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionDelta {
    /// A fragment of generated text
    Text(String),
    /// Token counts reported by the backend
    Usage {
        prompt_tokens: u32,
        completion_tokens: u32,
    },
    /// The backend finished generating
    Finished,
}

/// Chunk of a streamed response as seen by consumers.
///
/// A well-formed stream is zero or more `Content` chunks followed by exactly
/// one `End` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    Content { content: String },
    End { model: String, usage: Usage },
    Error { message: String },
}

impl StreamChunk {
    pub fn content(content: impl Into<String>) -> Self {
        Self::Content {
            content: content.into(),
        }
    }

    pub fn end(model: impl Into<String>, usage: Usage) -> Self {
        Self::End {
            model: model.into(),
            usage,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Content { .. })
    }
}
