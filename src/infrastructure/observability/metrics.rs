//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use super::config::MetricsConfig;

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("uuid pattern compiles")
});

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/\d+(/|$)").expect("numeric pattern compiles")
});

const MAX_PATH_LABEL_LEN: usize = 50;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

/// Install the global Prometheus recorder.
///
/// Returns `None` when metrics are disabled or a recorder is already
/// installed for this process.
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("ai_relay_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!(path = %config.path, "Prometheus metrics initialized");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize Prometheus metrics");
            None
        }
    }
}

/// Router serving the rendered metrics at `path`
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("ai_relay_http_requests_total", &labels).increment(1);
    histogram!("ai_relay_http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record one backend call made by the provider capability
pub fn record_provider_request(
    provider: &str,
    model: &str,
    success: bool,
    duration: Duration,
    tokens: u32,
) {
    let labels = [
        ("provider", provider.to_string()),
        ("model", model.to_string()),
        ("status", outcome_label(success).to_string()),
    ];

    counter!("ai_relay_provider_requests_total", &labels).increment(1);
    histogram!("ai_relay_provider_request_duration_seconds", &labels)
        .record(duration.as_secs_f64());

    if tokens > 0 {
        counter!("ai_relay_tokens_total", &labels).increment(u64::from(tokens));
    }
}

/// Record one relay attempt; attempts after the first also count as retries
pub fn record_relay_attempt(operation: &str, attempt: u32, success: bool) {
    let labels = [
        ("operation", operation.to_string()),
        ("status", outcome_label(success).to_string()),
    ];

    counter!("ai_relay_relay_attempts_total", &labels).increment(1);

    if attempt > 1 {
        counter!("ai_relay_relay_retries_total", "operation" => operation.to_string())
            .increment(1);
    }
}

fn outcome_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

/// Sanitize URL path for metric labels (remove IDs, limit cardinality)
fn sanitize_path(path: &str) -> String {
    let path = UUID_SEGMENT.replace_all(path, "{id}");
    let path = NUMERIC_SEGMENT.replace_all(&path, "/{id}$1");

    path.chars().take(MAX_PATH_LABEL_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_uuid() {
        let path = "/history/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(sanitize_path(path), "/history/{id}");
    }

    #[test]
    fn test_sanitize_path_numeric_id() {
        assert_eq!(sanitize_path("/history/123/entry"), "/history/{id}/entry");
        assert_eq!(sanitize_path("/history/42"), "/history/{id}");
    }

    #[test]
    fn test_sanitize_path_no_id() {
        assert_eq!(sanitize_path("/send/stream"), "/send/stream");
    }

    #[test]
    fn test_sanitize_path_truncates_long_paths() {
        let path = "/very/long/path/that/exceeds/the/maximum/allowed/length/for/metrics";
        assert_eq!(sanitize_path(path).len(), MAX_PATH_LABEL_LEN);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_http_request("POST", "/process", 200, Duration::from_millis(5));
        record_provider_request("mock", "mock-model", true, Duration::from_millis(5), 12);
        record_relay_attempt("send_message", 2, false);
    }

    #[test]
    fn test_disabled_metrics_are_not_installed() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };

        assert!(init_metrics(&config).is_none());
    }
}
