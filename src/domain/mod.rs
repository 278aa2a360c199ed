//! Domain layer - Core business logic and entities

pub mod config;
pub mod conversation;
pub mod credentials;
pub mod error;
pub mod llm;
pub mod usage;

pub use config::{ProviderConfig, RetryPolicy};
pub use conversation::{ConversationEntry, ConversationSnapshot, ConversationStore};
pub use credentials::{Credential, CredentialProvider};
pub use error::{DomainError, TransportError};
pub use llm::{
    AiResponse, ChunkStream, Completion, CompletionDelta, CompletionRequest, ConfigOverrides,
    DeltaStream, GenerationSettings, HealthStatus, LlmBackend, Message, MessageRole,
    ModelCatalog, PromptMessage, ProviderHealth, ProviderKind, ProviderSettings, ResponderHealth,
    ResponseStatus, StreamChunk, Usage,
};
pub use usage::{estimate_cost, CostEstimate, ModelUsage, UsageStats};

#[cfg(test)]
pub use llm::ScriptedBackend;
