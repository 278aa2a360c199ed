//! LLM backend implementations and the provider capability in front of them

mod ai_provider;
mod bedrock;
mod factory;
mod http_client;
mod mock;
mod openai;
pub mod sse;

pub use ai_provider::AiProvider;
pub use bedrock::{BedrockBackend, BedrockClient, BedrockClientTrait};
pub use factory::{BackendFactory, ConfiguredBackendFactory, LlmProviderFactory};
pub use http_client::{HttpClient, HttpClientTrait};
pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use sse::{decode_frame, encode_chunk, SseDecoder, SseFrame, DONE_SENTINEL};
