use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::forwarder;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::responder;
use super::state::{ForwarderState, ResponderState};

/// Routes of the responder server
pub fn create_responder_router(state: ResponderState) -> Router {
    Router::new()
        .route("/live", get(health::live_check))
        .route("/health", get(responder::health))
        .route("/process", post(responder::process))
        .route("/stream", post(responder::stream))
        .route("/models", get(responder::list_models))
        .route(
            "/config",
            get(responder::get_config).put(responder::update_config),
        )
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Routes of the forwarder server
pub fn create_forwarder_router(state: ForwarderState) -> Router {
    Router::new()
        .route("/live", get(health::live_check))
        .route("/send", post(forwarder::send))
        .route("/send/stream", post(forwarder::send_stream))
        .route("/history", get(forwarder::history))
        .route("/stats", get(forwarder::stats))
        .route("/responder/health", get(forwarder::responder_health))
        .route("/responder/models", get(forwarder::responder_models))
        .route("/responder/config", get(forwarder::responder_config))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
