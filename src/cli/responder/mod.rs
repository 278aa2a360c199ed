//! Responder command - serves the provider-backed endpoints

use std::sync::Arc;

use tracing::info;

use crate::api::router::create_responder_router;
use crate::api::state::ResponderState;
use crate::infrastructure::credentials::EnvCredentialProvider;
use crate::infrastructure::llm::AiProvider;
use crate::infrastructure::services::ResponderService;

/// Run the responder server
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap();

    let credentials = EnvCredentialProvider::new().with_defaults();
    let provider_config = config.provider_config(&credentials).await?;
    let defaults = provider_config.defaults.clone();

    info!(
        provider = %provider_config.kind,
        model = %defaults.default_model,
        configured = provider_config.is_configured(),
        "Responder provider selected"
    );

    let responder = ResponderService::new(Arc::new(AiProvider::new(provider_config)), defaults);
    let app = create_responder_router(ResponderState::new(Arc::new(responder)));

    super::serve("responder", app, config.server.socket_addr()?, &config).await
}
