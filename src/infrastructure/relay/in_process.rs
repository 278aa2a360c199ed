//! Transport that calls a responder living in the same process

use async_trait::async_trait;
use std::sync::Arc;

use super::transport::{status_error, ResponderTransport};
use crate::domain::{
    AiResponse, ChunkStream, Message, ModelCatalog, ProviderSettings, ResponderHealth,
    TransportError,
};
use crate::infrastructure::services::ResponderService;

#[derive(Debug, Clone)]
pub struct InProcessTransport {
    responder: Arc<ResponderService>,
}

impl InProcessTransport {
    pub fn new(responder: Arc<ResponderService>) -> Self {
        Self { responder }
    }
}

#[async_trait]
impl ResponderTransport for InProcessTransport {
    async fn process(&self, message: &Message) -> Result<AiResponse, TransportError> {
        self.responder
            .process(message)
            .await
            .map_err(|e| status_error(&e))
    }

    async fn open_stream(&self, message: &Message) -> Result<ChunkStream, TransportError> {
        self.responder
            .stream(message)
            .await
            .map_err(|e| status_error(&e))
    }

    async fn health(&self) -> Result<ResponderHealth, TransportError> {
        Ok(self.responder.health().await)
    }

    async fn list_models(&self) -> Result<ModelCatalog, TransportError> {
        self.responder.list_models().map_err(|e| status_error(&e))
    }

    async fn get_config(&self) -> Result<ProviderSettings, TransportError> {
        self.responder.get_config().map_err(|e| status_error(&e))
    }

    fn target(&self) -> String {
        "in-process".to_string()
    }
}
