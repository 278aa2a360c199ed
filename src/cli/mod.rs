//! CLI for the AI relay
//!
//! Subcommands:
//! - `responder`: serve the provider-backed responder
//! - `forwarder`: serve the retrying relay with history and stats
//! - `send`, `health`, `models`: one-shot calls through the relay

pub mod client;
pub mod forwarder;
pub mod responder;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::infrastructure::conversation::InMemoryConversationStore;
use crate::infrastructure::logging;
use crate::infrastructure::observability::{create_metrics_router, init_metrics};
use crate::infrastructure::relay::{HttpResponderTransport, RelayService};

/// AI relay - forward messages to interchangeable AI providers
#[derive(Parser)]
#[command(name = "ai-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the responder server
    Responder,

    /// Run the forwarder server
    Forwarder,

    /// Relay one message and print the response
    Send(client::SendArgs),

    /// Print the responder's health as seen by the relay
    Health,

    /// Print the models the responder offers
    Models,
}

/// Load `.env` and configuration, then install logging.
/// Invalid configuration is reported and replaced by defaults.
pub(crate) fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let loaded = AppConfig::load();
    let config = loaded.as_ref().ok().cloned().unwrap_or_default();
    logging::init_logging(&config.logging);

    if let Err(e) = loaded {
        warn!(error = %e, "Failed to load configuration, using defaults");
    }

    config
}

/// Relay wired to the configured responder over HTTP
pub(crate) fn build_relay(config: &AppConfig) -> anyhow::Result<RelayService> {
    let transport =
        HttpResponderTransport::new(&config.relay.responder_url, config.relay.request_timeout())?;

    let store = match config.relay.history_cap {
        Some(cap) => InMemoryConversationStore::with_capacity_limit(cap),
        None => InMemoryConversationStore::new(),
    };

    Ok(RelayService::new(
        Arc::new(transport),
        Arc::new(store),
        config.retry_policy()?,
    ))
}

/// Bind and serve until Ctrl+C or SIGTERM, adding `/metrics` when enabled
pub(crate) async fn serve(
    name: &str,
    app: Router,
    addr: SocketAddr,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let mut app = app;
    if let Some(metrics) = init_metrics(&config.metrics) {
        app = app.merge(create_metrics_router(metrics, &config.metrics.path));
    }

    let listener = TcpListener::bind(addr).await?;
    info!("Starting {} on {}", name, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("{} shutdown complete", name);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::parse_from([
            "ai-relay",
            "send",
            "What is Rust?",
            "--model",
            "gpt-4o",
            "--temperature",
            "0.5",
            "--stream",
        ]);

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.message, "What is Rust?");
                assert_eq!(args.model.as_deref(), Some("gpt-4o"));
                assert_eq!(args.temperature, Some(0.5));
                assert!(args.stream);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_build_relay_uses_configured_policy() {
        let mut config = AppConfig::default();
        config.relay.max_attempts = 5;

        let relay = build_relay(&config).unwrap();
        assert_eq!(relay.policy().max_attempts, 5);
    }

    #[test]
    fn test_build_relay_rejects_invalid_policy() {
        let mut config = AppConfig::default();
        config.relay.multiplier = 0.1;

        assert!(build_relay(&config).is_err());
    }
}
