//! Messages, responses and the backend abstraction

mod health;
mod message;
mod provider;
mod request;
mod response;
mod settings;
pub mod validation;

pub use health::{HealthStatus, ModelCatalog, ProviderHealth, ResponderHealth};
pub use message::{Message, MessageRole, PromptMessage};
pub use provider::{ChunkStream, DeltaStream, LlmBackend};
pub use request::{CompletionRequest, CompletionRequestBuilder, DEFAULT_SYSTEM_PROMPT};
pub use response::{AiResponse, Completion, CompletionDelta, ResponseStatus, StreamChunk, Usage};
pub use settings::{ConfigOverrides, GenerationSettings, ProviderKind, ProviderSettings};

#[cfg(test)]
pub use provider::mock::ScriptedBackend;
