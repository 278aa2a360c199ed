//! Infrastructure layer - External service implementations

pub mod conversation;
pub mod credentials;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod relay;
pub mod services;
