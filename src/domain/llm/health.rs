//! Health and catalog reports produced by a responder

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProviderKind;

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unreachable,
}

/// State of the configured AI backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHealth {
    /// Whether the credentials the backend needs are present
    pub configured: bool,
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderHealth {
    pub fn healthy(configured: bool) -> Self {
        Self {
            configured,
            status: HealthStatus::Healthy,
            error: None,
        }
    }

    pub fn degraded(configured: bool, error: impl Into<String>) -> Self {
        Self {
            configured,
            status: HealthStatus::Degraded,
            error: Some(error.into()),
        }
    }

    pub fn unreachable(configured: bool, error: impl Into<String>) -> Self {
        Self {
            configured,
            status: HealthStatus::Unreachable,
            error: Some(error.into()),
        }
    }
}

/// Full health report of a responder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponderHealth {
    pub status: HealthStatus,
    pub server: String,
    pub timestamp: DateTime<Utc>,
    pub messages_processed: u64,
    pub provider: ProviderKind,
    pub ai: ProviderHealth,
}

impl ResponderHealth {
    /// A responder is healthy when its backend is; otherwise it still serves
    /// requests and reports itself degraded.
    pub fn new(provider: ProviderKind, messages_processed: u64, ai: ProviderHealth) -> Self {
        let status = match ai.status {
            HealthStatus::Healthy => HealthStatus::Healthy,
            _ => HealthStatus::Degraded,
        };

        Self {
            status,
            server: "responder".to_string(),
            timestamp: Utc::now(),
            messages_processed,
            provider,
            ai,
        }
    }
}

/// Models a responder advertises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub provider: ProviderKind,
    pub models: BTreeSet<String>,
    pub default: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responder_status_follows_backend() {
        let healthy = ResponderHealth::new(ProviderKind::Mock, 3, ProviderHealth::healthy(true));
        assert_eq!(healthy.status, HealthStatus::Healthy);

        let degraded = ResponderHealth::new(
            ProviderKind::OpenAi,
            0,
            ProviderHealth::degraded(false, "OPENAI_API_KEY is not set"),
        );
        assert_eq!(degraded.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_health_wire_format() {
        let health = ResponderHealth::new(
            ProviderKind::Bedrock,
            7,
            ProviderHealth::unreachable(true, "timeout"),
        );
        let json = serde_json::to_value(&health).unwrap();

        assert_eq!(json["status"], "degraded");
        assert_eq!(json["messagesProcessed"], 7);
        assert_eq!(json["provider"], "bedrock");
        assert_eq!(json["ai"]["status"], "unreachable");
        assert_eq!(json["ai"]["error"], "timeout");
    }
}
