//! Forwarder-side relay to a responder

mod http_transport;
mod in_process;
mod retry;
mod service;
pub mod transport;

pub use http_transport::HttpResponderTransport;
pub use in_process::InProcessTransport;
pub use retry::retry_with_backoff;
pub use service::RelayService;
pub use transport::ResponderTransport;
