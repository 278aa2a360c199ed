use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::{
    AiResponse, ChunkStream, DomainError, Message, ModelCatalog, ProviderSettings,
    ResponderHealth, TransportError,
};

/// How the forwarder reaches a responder.
///
/// One call is one attempt; retrying is the relay's job. Errors are
/// classified by [`TransportError::is_retryable`].
#[async_trait]
pub trait ResponderTransport: Send + Sync + Debug {
    async fn process(&self, message: &Message) -> Result<AiResponse, TransportError>;

    /// Establish a chunk stream. Failures after this returns arrive as an
    /// `Error` chunk.
    async fn open_stream(&self, message: &Message) -> Result<ChunkStream, TransportError>;

    async fn health(&self) -> Result<ResponderHealth, TransportError>;

    async fn list_models(&self) -> Result<ModelCatalog, TransportError>;

    async fn get_config(&self) -> Result<ProviderSettings, TransportError>;

    /// Where requests go, for logs
    fn target(&self) -> String;
}

/// Map a responder-side error to what the forwarder would see over HTTP
pub fn status_error(err: &DomainError) -> TransportError {
    TransportError::status(err.status_code(), err.message())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_keeps_classification() {
        let terminal = status_error(&DomainError::invalid_request("Message too long"));
        assert_eq!(terminal, TransportError::status(400, "Message too long"));
        assert!(!terminal.is_retryable());

        assert!(status_error(&DomainError::backend_error("openai", "HTTP 500")).is_retryable());
        assert!(status_error(&DomainError::backend_unavailable("openai", "no key")).is_retryable());
        assert!(status_error(&DomainError::rate_limited("openai", "slow")).is_retryable());
    }
}
