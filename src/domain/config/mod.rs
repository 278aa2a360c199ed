//! Process-level configuration values: backend wiring and retry policy

mod provider;
mod retry;

pub use provider::ProviderConfig;
pub use retry::RetryPolicy;
