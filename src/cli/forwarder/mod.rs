//! Forwarder command - serves the relay, history and stats endpoints

use std::sync::Arc;

use tracing::info;

use crate::api::router::create_forwarder_router;
use crate::api::state::ForwarderState;

/// Run the forwarder server
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap();
    let relay = super::build_relay(&config)?;

    info!(
        responder = %config.relay.responder_url,
        max_attempts = relay.policy().max_attempts,
        "Forwarding to responder"
    );

    let app = create_forwarder_router(ForwarderState::new(Arc::new(relay)));
    super::serve("forwarder", app, config.forwarder.socket_addr()?, &config).await
}
