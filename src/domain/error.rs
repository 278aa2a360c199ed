use thiserror::Error;

/// Failure of a single call from the forwarder to the responder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Responder returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Connect failures, timeouts, 5xx, 429 and undecodable bodies are worth
    /// another attempt. Any other status is the caller's fault.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Timeout(_) | Self::Malformed(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
        }
    }

    /// The message without the transport prefix
    pub fn detail(&self) -> &str {
        match self {
            Self::Connect(message) | Self::Timeout(message) | Self::Malformed(message) => message,
            Self::Status { message, .. } => message,
        }
    }
}

/// Core domain errors
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Backend unavailable: {provider} - {message}")]
    BackendUnavailable { provider: String, message: String },

    #[error("Backend error: {provider} - {message}")]
    BackendError { provider: String, message: String },

    #[error("Rate limited by {provider}: {message}")]
    RateLimited { provider: String, message: String },

    #[error("Relay failed after {attempts} attempt(s): {last}")]
    RelayExhausted { attempts: u32, last: TransportError },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn backend_unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn backend_error(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn relay_exhausted(attempts: u32, last: TransportError) -> Self {
        Self::RelayExhausted { attempts, last }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Short machine-readable label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::BackendUnavailable { .. } => "backend_unavailable",
            Self::BackendError { .. } => "backend_error",
            Self::RateLimited { .. } => "rate_limited",
            Self::RelayExhausted { .. } => "relay_exhausted",
            Self::InvalidConfig { .. } => "invalid_config",
            Self::Internal { .. } => "internal",
        }
    }

    /// HTTP status the error is reported with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } | Self::InvalidConfig { .. } => 400,
            Self::RateLimited { .. } => 429,
            Self::BackendError { .. } => 502,
            Self::BackendUnavailable { .. } => 503,
            Self::RelayExhausted { .. } => 504,
            Self::Internal { .. } => 500,
        }
    }

    /// Human-readable message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Self::InvalidRequest { message }
            | Self::InvalidConfig { message }
            | Self::Internal { message } => message.clone(),
            Self::BackendUnavailable { provider, message }
            | Self::BackendError { provider, message }
            | Self::RateLimited { provider, message } => format!("{}: {}", provider, message),
            Self::RelayExhausted { .. } => self.to_string(),
        }
    }
}
