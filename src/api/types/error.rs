//! JSON error bodies

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Error categories reported in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    RateLimitError,
    UpstreamError,
    ServiceUnavailableError,
    TimeoutError,
    ServerError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::RateLimitError => write!(f, "rate_limit_error"),
            Self::UpstreamError => write!(f, "upstream_error"),
            Self::ServiceUnavailableError => write!(f, "service_unavailable_error"),
            Self::TimeoutError => write!(f, "timeout_error"),
            Self::ServerError => write!(f, "server_error"),
        }
    }
}

/// `{"error": {...}}` envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    code: None,
                },
            },
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, ApiErrorType::RateLimitError, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, ApiErrorType::UpstreamError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ServiceUnavailableError,
            message,
        )
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, ApiErrorType::TimeoutError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.message();
        let error = match &err {
            DomainError::InvalidRequest { .. } | DomainError::InvalidConfig { .. } => {
                Self::bad_request(message)
            }
            DomainError::RateLimited { .. } => Self::rate_limited(message),
            DomainError::BackendError { .. } => Self::bad_gateway(message),
            DomainError::BackendUnavailable { .. } => Self::unavailable(message),
            DomainError::RelayExhausted { .. } => Self::gateway_timeout(message),
            DomainError::Internal { .. } => Self::internal(message),
        };

        error.with_code(err.kind())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransportError;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::bad_request("Invalid model");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.error_type, ApiErrorType::InvalidRequestError);
        assert_eq!(err.response.error.message, "Invalid model");
    }

    #[test]
    fn test_domain_error_conversion() {
        let cases = [
            (DomainError::invalid_request("x"), StatusCode::BAD_REQUEST),
            (DomainError::invalid_config("x"), StatusCode::BAD_REQUEST),
            (DomainError::rate_limited("openai", "x"), StatusCode::TOO_MANY_REQUESTS),
            (DomainError::backend_error("openai", "x"), StatusCode::BAD_GATEWAY),
            (DomainError::backend_unavailable("openai", "x"), StatusCode::SERVICE_UNAVAILABLE),
            (
                DomainError::relay_exhausted(3, TransportError::connect("refused")),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (DomainError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (domain_err, status) in cases {
            let expected_code = domain_err.kind();
            let api_err = ApiError::from(domain_err);
            assert_eq!(api_err.status, status);
            assert_eq!(api_err.status.as_u16(), status.as_u16());
            assert_eq!(api_err.response.error.code.as_deref(), Some(expected_code));
        }
    }

    #[test]
    fn test_status_matches_domain_status_code() {
        let err = DomainError::backend_unavailable("bedrock", "no identity");
        let expected = err.status_code();
        assert_eq!(ApiError::from(err).status.as_u16(), expected);
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::from(DomainError::invalid_request("Message too long"));
        let json = serde_json::to_value(&err.response).unwrap();

        assert_eq!(json["error"]["message"], "Message too long");
        assert_eq!(json["error"]["type"], "invalid_request_error");
        assert_eq!(json["error"]["code"], "invalid_request");
    }
}
