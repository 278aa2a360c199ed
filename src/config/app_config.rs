use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::domain::{
    CredentialProvider, DomainError, GenerationSettings, ProviderConfig, ProviderKind,
    RetryPolicy,
};
use crate::infrastructure::observability::MetricsConfig;

/// Legacy environment variables, mapped onto config keys.
/// They sit below files and `APP__*` variables.
const LEGACY_VARS: &[(&str, &str)] = &[
    ("AI_PROVIDER", "provider.kind"),
    ("AI_TEMPERATURE", "provider.temperature"),
    ("AI_MAX_TOKENS", "provider.max_tokens"),
    ("SERVER_B_URL", "relay.responder_url"),
    ("TIMEOUT_SECONDS", "relay.request_timeout_secs"),
];

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "ServerConfig::forwarder")]
    pub forwarder: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub relay: RelaySection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn forwarder() -> Self {
        Self {
            port: 8001,
            ..Self::default()
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(SocketAddr::from((self.host.parse::<IpAddr>()?, self.port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Backend selection and generation defaults of the responder
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub kind: ProviderKind,
    /// Falls back to the per-kind legacy variable, then the kind's default
    pub default_model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub base_url: Option<String>,
    pub region: Option<String>,
    pub mock_delay_ms: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        let settings = GenerationSettings::default();
        Self {
            kind: ProviderKind::default(),
            default_model: None,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            base_url: None,
            region: None,
            mock_delay_ms: 0,
        }
    }
}

/// How the forwarder reaches its responder
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelaySection {
    pub responder_url: String,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_elapsed_ms: Option<u64>,
    pub history_cap: Option<usize>,
}

impl Default for RelaySection {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            responder_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 120,
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            multiplier: policy.multiplier,
            max_elapsed_ms: None,
            history_cap: None,
        }
    }
}

impl RelaySection {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            forwarder: ServerConfig::forwarder(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            provider: ProviderSection::default(),
            relay: RelaySection::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Load with an explicit lookup for the legacy variables
    pub fn load_with(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        for (key, value) in legacy_defaults(&lookup) {
            builder = builder.set_default(key, value)?;
        }

        let config = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app: Self = config.try_deserialize()?;
        if app.provider.default_model.is_none() {
            app.provider.default_model = legacy_model(app.provider.kind, &lookup);
        }
        Ok(app)
    }

    /// Generation defaults the responder starts with
    pub fn generation_settings(&self) -> GenerationSettings {
        let model = self
            .provider
            .default_model
            .clone()
            .unwrap_or_else(|| self.provider.kind.default_model().to_string());

        GenerationSettings::new(model, self.provider.temperature, self.provider.max_tokens)
    }

    /// Build the backend wiring. A missing credential is not an error here:
    /// the backend reports it on first use.
    pub async fn provider_config(
        &self,
        credentials: &dyn CredentialProvider,
    ) -> Result<ProviderConfig, DomainError> {
        let kind = self.provider.kind;
        let mut config = ProviderConfig::new(kind)
            .with_defaults(self.generation_settings())
            .with_mock_delay(Duration::from_millis(self.provider.mock_delay_ms));

        if kind != ProviderKind::Mock {
            match credentials.get_credential(kind).await {
                Ok(credential) => {
                    if let Some(region) = credential.get_param("region") {
                        config = config.with_region(region.clone());
                    }
                    config = config.with_credential(credential);
                }
                Err(e) => warn!(
                    provider = %kind,
                    source = credentials.provider_name(),
                    error = %e,
                    "Backend credentials not found; requests will fail until they are provided"
                ),
            }
        }

        if let Some(base_url) = &self.provider.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(region) = &self.provider.region {
            config = config.with_region(region.clone());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, DomainError> {
        let relay = &self.relay;
        let mut policy = RetryPolicy::new(relay.max_attempts, Duration::from_millis(relay.base_delay_ms))
            .with_multiplier(relay.multiplier);
        if let Some(ms) = relay.max_elapsed_ms {
            policy = policy.with_max_elapsed(Duration::from_millis(ms));
        }

        policy.validate()?;
        Ok(policy)
    }
}

fn legacy_defaults(lookup: &impl Fn(&str) -> Option<String>) -> Vec<(&'static str, String)> {
    LEGACY_VARS
        .iter()
        .filter_map(|(var, key)| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (*key, v.trim().to_string()))
        })
        .collect()
}

fn legacy_model(kind: ProviderKind, lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    let var = match kind {
        ProviderKind::OpenAi => "OPENAI_DEFAULT_MODEL",
        ProviderKind::Bedrock => "BEDROCK_DEFAULT_MODEL",
        ProviderKind::Mock => return None,
    };
    lookup(var).filter(|v| !v.trim().is_empty())
}
