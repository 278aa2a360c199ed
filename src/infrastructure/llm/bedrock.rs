//! AWS Bedrock backend for Anthropic Claude models

use std::pin::Pin;

use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::domain::usage::resolve_model_alias;
use crate::domain::{
    Completion, CompletionDelta, CompletionRequest, DeltaStream, DomainError, LlmBackend,
    MessageRole, PromptMessage,
};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Raw event payloads of an InvokeModelWithResponseStream call
pub type PayloadStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, DomainError>> + Send>>;

/// AWS Bedrock client trait for dependency injection
#[async_trait]
pub trait BedrockClientTrait: Send + Sync + std::fmt::Debug {
    async fn invoke_model(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>, DomainError>;

    async fn invoke_model_stream(
        &self,
        model_id: &str,
        body: Vec<u8>,
    ) -> Result<PayloadStream, DomainError>;
}

/// AWS Bedrock API backend
#[derive(Debug)]
pub struct BedrockBackend<C: BedrockClientTrait> {
    client: C,
}

impl<C: BedrockClientTrait> BedrockBackend<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    fn build_claude_request(&self, request: &CompletionRequest) -> Result<Vec<u8>, DomainError> {
        let (system, messages) = split_system_messages(&request.messages);

        let anthropic_messages: Vec<BedrockMessage> =
            messages.into_iter().map(BedrockMessage::from_domain).collect();

        let mut body = serde_json::json!({
            "anthropic_version": ANTHROPIC_VERSION,
            "messages": anthropic_messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        if let Some(system_content) = system {
            body["system"] = serde_json::json!(system_content);
        }

        serde_json::to_vec(&body).map_err(|e| {
            DomainError::backend_error("bedrock", format!("Failed to serialize request: {}", e))
        })
    }

    fn parse_claude_response(&self, model: &str, bytes: &[u8]) -> Result<Completion, DomainError> {
        let response: BedrockClaudeResponse = serde_json::from_slice(bytes).map_err(|e| {
            DomainError::backend_error("bedrock", format!("Failed to parse response: {}", e))
        })?;

        let content = response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(Completion::new(model, content)
            .with_usage(response.usage.input_tokens, response.usage.output_tokens))
    }
}

#[async_trait]
impl<C: BedrockClientTrait> LlmBackend for BedrockBackend<C> {
    async fn chat(&self, request: &CompletionRequest) -> Result<Completion, DomainError> {
        let model_id = resolve_model_alias(&request.model);
        let body = self.build_claude_request(request)?;

        let response_bytes = self.client.invoke_model(model_id, body).await?;

        self.parse_claude_response(model_id, &response_bytes)
    }

    async fn chat_stream(&self, request: &CompletionRequest) -> Result<DeltaStream, DomainError> {
        let model_id = resolve_model_alias(&request.model);
        let body = self.build_claude_request(request)?;

        let payloads = self.client.invoke_model_stream(model_id, body).await?;

        let deltas = payloads
            .scan(StreamUsage::default(), |usage, payload| {
                let events = match payload {
                    Ok(bytes) => usage.apply(&bytes),
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(stream::iter(events)))
            })
            .flatten();

        Ok(Box::pin(deltas))
    }

    fn provider_name(&self) -> &'static str {
        "bedrock"
    }
}

/// Token counts collected across Claude stream events
#[derive(Debug, Default)]
struct StreamUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl StreamUsage {
    fn apply(&mut self, bytes: &[u8]) -> Vec<Result<CompletionDelta, DomainError>> {
        if bytes.is_empty() {
            return Vec::new();
        }

        let event: ClaudeStreamEvent = match serde_json::from_slice(bytes) {
            Ok(event) => event,
            Err(e) => {
                return vec![Err(DomainError::backend_error(
                    "bedrock",
                    format!("Failed to parse stream event: {}", e),
                ))];
            }
        };

        match event {
            ClaudeStreamEvent::MessageStart { message } => {
                self.input_tokens = message.usage.input_tokens;
                Vec::new()
            }
            ClaudeStreamEvent::ContentBlockDelta { delta } => match delta.text {
                Some(text) if !text.is_empty() => vec![Ok(CompletionDelta::Text(text))],
                _ => Vec::new(),
            },
            ClaudeStreamEvent::MessageDelta { usage } => {
                if let Some(usage) = usage {
                    self.output_tokens = usage.output_tokens;
                }
                Vec::new()
            }
            ClaudeStreamEvent::MessageStop => vec![
                Ok(CompletionDelta::Usage {
                    prompt_tokens: self.input_tokens,
                    completion_tokens: self.output_tokens,
                }),
                Ok(CompletionDelta::Finished),
            ],
            ClaudeStreamEvent::Error { error } => vec![Err(DomainError::backend_error(
                "bedrock",
                error.message,
            ))],
            ClaudeStreamEvent::Other => Vec::new(),
        }
    }
}

fn split_system_messages(messages: &[PromptMessage]) -> (Option<String>, Vec<&PromptMessage>) {
    let mut system_content = String::new();
    let mut other_messages = Vec::new();

    for msg in messages {
        if msg.role == MessageRole::System {
            if !system_content.is_empty() {
                system_content.push('\n');
            }
            system_content.push_str(&msg.content);
        } else {
            other_messages.push(msg);
        }
    }

    let system = if system_content.is_empty() {
        None
    } else {
        Some(system_content)
    };

    (system, other_messages)
}

// Bedrock API types

#[derive(Debug, Serialize)]
struct BedrockMessage {
    role: &'static str,
    content: String,
}

impl BedrockMessage {
    fn from_domain(message: &PromptMessage) -> Self {
        Self {
            role: "user",
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BedrockClaudeResponse {
    content: Vec<ContentBlock>,
    usage: ClaudeUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeStreamEvent {
    MessageStart { message: ClaudeStreamMessage },
    ContentBlockDelta { delta: ClaudeTextDelta },
    MessageDelta { usage: Option<ClaudeUsage> },
    MessageStop,
    Error { error: ClaudeStreamError },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ClaudeStreamMessage {
    usage: ClaudeUsage,
}

#[derive(Debug, Deserialize)]
struct ClaudeTextDelta {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeStreamError {
    message: String,
}

/// Real AWS Bedrock client implementation
#[derive(Debug, Clone)]
pub struct BedrockClient {
    client: aws_sdk_bedrockruntime::Client,
}

impl BedrockClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        let client = aws_sdk_bedrockruntime::Client::new(config);
        Self { client }
    }
}

#[async_trait]
impl BedrockClientTrait for BedrockClient {
    async fn invoke_model(&self, model_id: &str, body: Vec<u8>) -> Result<Vec<u8>, DomainError> {
        let blob = aws_sdk_bedrockruntime::primitives::Blob::new(body);

        let response = self
            .client
            .invoke_model()
            .model_id(model_id)
            .body(blob)
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| {
                let throttled = e
                    .as_service_error()
                    .is_some_and(|se| se.is_throttling_exception());
                if throttled {
                    DomainError::rate_limited("bedrock", format!("API error: {}", e))
                } else {
                    DomainError::backend_error("bedrock", format!("API error: {}", e))
                }
            })?;

        Ok(response.body.into_inner())
    }

    async fn invoke_model_stream(
        &self,
        model_id: &str,
        body: Vec<u8>,
    ) -> Result<PayloadStream, DomainError> {
        use aws_sdk_bedrockruntime::types::ResponseStream;

        let blob = aws_sdk_bedrockruntime::primitives::Blob::new(body);

        let response = self
            .client
            .invoke_model_with_response_stream()
            .model_id(model_id)
            .body(blob)
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| DomainError::backend_error("bedrock", format!("API error: {}", e)))?;

        let payloads = stream::unfold(Some(response.body), |receiver| async move {
            let mut receiver = receiver?;
            match receiver.recv().await {
                Ok(Some(ResponseStream::Chunk(part))) => {
                    let bytes = part.bytes.map(|b| b.into_inner()).unwrap_or_default();
                    Some((Ok(bytes), Some(receiver)))
                }
                Ok(Some(_)) => Some((Ok(Vec::new()), Some(receiver))),
                Ok(None) => None,
                Err(e) => Some((
                    Err(DomainError::backend_error("bedrock", format!("Stream error: {}", e))),
                    None,
                )),
            }
        });

        Ok(Box::pin(payloads))
    }
}
