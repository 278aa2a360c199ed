use std::collections::VecDeque;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::http_client::HttpClientTrait;
use super::sse::{data_payloads, DONE_SENTINEL};
use crate::domain::{
    Completion, CompletionDelta, CompletionRequest, DeltaStream, DomainError, LlmBackend,
    MessageRole, PromptMessage,
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// OpenAI API backend
#[derive(Debug)]
pub struct OpenAiBackend<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiBackend<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/v1/models", self.base_url)
    }

    fn build_request(&self, request: &CompletionRequest, stream: bool) -> serde_json::Value {
        let messages: Vec<OpenAiMessage> = request
            .messages
            .iter()
            .map(OpenAiMessage::from_domain)
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": stream,
        });

        if stream {
            body["stream_options"] = serde_json::json!({ "include_usage": true });
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<Completion, DomainError> {
        let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::backend_error("openai", format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::backend_error("openai", "No choices in response"))?;

        let mut completion =
            Completion::new(response.model, choice.message.content.unwrap_or_default());

        if let Some(usage) = response.usage {
            completion = completion.with_usage(usage.prompt_tokens, usage.completion_tokens);
        }

        Ok(completion)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmBackend for OpenAiBackend<C> {
    async fn chat(&self, request: &CompletionRequest) -> Result<Completion, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(request, false);
        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await?;

        self.parse_response(response)
    }

    async fn chat_stream(&self, request: &CompletionRequest) -> Result<DeltaStream, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(request, true);
        let byte_stream = self
            .client
            .post_json_stream(&url, self.headers(), &body)
            .await?;

        let payloads = Box::pin(data_payloads(byte_stream));
        let deltas = payloads.flat_map(|payload| {
            let events = match payload {
                Ok(data) => parse_stream_payload(&data),
                Err(e) => VecDeque::from([Err(e)]),
            };
            stream::iter(events)
        });

        Ok(Box::pin(deltas))
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        self.client
            .get_json(&self.models_url(), self.headers())
            .await
            .map(|_| ())
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

fn parse_stream_payload(data: &str) -> VecDeque<Result<CompletionDelta, DomainError>> {
    let mut events = VecDeque::new();

    if data.trim() == DONE_SENTINEL {
        events.push_back(Ok(CompletionDelta::Finished));
        return events;
    }

    let chunk: OpenAiStreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            events.push_back(Err(DomainError::backend_error(
                "openai",
                format!("Failed to parse stream chunk: {}", e),
            )));
            return events;
        }
    };

    if let Some(content) = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|c| !c.is_empty())
    {
        events.push_back(Ok(CompletionDelta::Text(content)));
    }

    // Sent in a final chunk with no choices when include_usage is set
    if let Some(usage) = chunk.usage {
        events.push_back(Ok(CompletionDelta::Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        }));
    }

    events
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

impl OpenAiMessage {
    fn from_domain(message: &PromptMessage) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
        };

        Self {
            role,
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
}

#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
}
