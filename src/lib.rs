//! AI relay
//!
//! A forwarder relays user messages, with retries and backoff, to a
//! responder that answers them through one of several interchangeable AI
//! backends (mock, OpenAI, AWS Bedrock). Token usage and estimated cost are
//! tracked on both sides; the forwarder keeps an in-memory conversation
//! history with aggregated statistics.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
