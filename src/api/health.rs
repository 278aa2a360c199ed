//! Liveness probe shared by both servers

use axum::{http::StatusCode, response::IntoResponse};

/// Returns 200 while the process is serving requests
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}
