//! Responder endpoint handlers

use axum::{extract::State, response::IntoResponse};
use tracing::debug;

use crate::api::state::ResponderState;
use crate::api::types::{sse_response, ApiError, Json};
use crate::domain::{
    AiResponse, ConfigOverrides, Message, ModelCatalog, ProviderSettings, ResponderHealth,
};

/// POST /process
pub async fn process(
    State(state): State<ResponderState>,
    Json(message): Json<Message>,
) -> Result<Json<AiResponse>, ApiError> {
    let response = state.responder.process(&message).await?;
    Ok(Json(response))
}

/// POST /stream
pub async fn stream(
    State(state): State<ResponderState>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse, ApiError> {
    let chunks = state.responder.stream(&message).await?;
    Ok(sse_response(chunks))
}

/// GET /health
pub async fn health(State(state): State<ResponderState>) -> Json<ResponderHealth> {
    Json(state.responder.health().await)
}

/// GET /models
pub async fn list_models(
    State(state): State<ResponderState>,
) -> Result<Json<ModelCatalog>, ApiError> {
    Ok(Json(state.responder.list_models()?))
}

/// GET /config
pub async fn get_config(
    State(state): State<ResponderState>,
) -> Result<Json<ProviderSettings>, ApiError> {
    Ok(Json(state.responder.get_config()?))
}

/// PUT /config
pub async fn update_config(
    State(state): State<ResponderState>,
    Json(overrides): Json<ConfigOverrides>,
) -> Result<Json<ProviderSettings>, ApiError> {
    debug!(?overrides, "Updating responder configuration");
    Ok(Json(state.responder.reconfigure(&overrides)?))
}
