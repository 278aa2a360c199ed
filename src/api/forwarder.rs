//! Forwarder endpoint handlers

use axum::{extract::State, response::IntoResponse};

use crate::api::state::ForwarderState;
use crate::api::types::{sse_response, ApiError, Json};
use crate::domain::{
    AiResponse, ConversationEntry, Message, ModelCatalog, ProviderSettings, ResponderHealth,
    UsageStats,
};

/// POST /send
pub async fn send(
    State(state): State<ForwarderState>,
    Json(message): Json<Message>,
) -> Result<Json<AiResponse>, ApiError> {
    Ok(Json(state.relay.send_message(message).await?))
}

/// POST /send/stream
pub async fn send_stream(
    State(state): State<ForwarderState>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse, ApiError> {
    let chunks = state.relay.send_message_stream(message).await?;
    Ok(sse_response(chunks))
}

/// GET /history
pub async fn history(
    State(state): State<ForwarderState>,
) -> Result<Json<Vec<ConversationEntry>>, ApiError> {
    Ok(Json(state.relay.history().await?))
}

/// GET /stats
pub async fn stats(State(state): State<ForwarderState>) -> Result<Json<UsageStats>, ApiError> {
    Ok(Json(state.relay.stats().await?))
}

/// GET /responder/health
pub async fn responder_health(
    State(state): State<ForwarderState>,
) -> Result<Json<ResponderHealth>, ApiError> {
    Ok(Json(state.relay.check_health().await?))
}

/// GET /responder/models
pub async fn responder_models(
    State(state): State<ForwarderState>,
) -> Result<Json<ModelCatalog>, ApiError> {
    Ok(Json(state.relay.list_models().await?))
}

/// GET /responder/config
pub async fn responder_config(
    State(state): State<ForwarderState>,
) -> Result<Json<ProviderSettings>, ApiError> {
    Ok(Json(state.relay.get_config().await?))
}
