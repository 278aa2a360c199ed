//! One-shot commands that go through the relay

use std::io::Write;

use clap::Args;
use futures::StreamExt;
use serde::Serialize;

use crate::domain::{Message, StreamChunk};
use crate::infrastructure::relay::RelayService;

/// Arguments for the send command
#[derive(Args, Clone, Debug)]
pub struct SendArgs {
    /// Message to relay
    pub message: String,

    /// Model override
    #[arg(long)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum completion tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// System prompt
    #[arg(long)]
    pub context: Option<String>,

    /// Print the response as it is generated
    #[arg(long)]
    pub stream: bool,
}

impl SendArgs {
    pub fn to_message(&self) -> Message {
        let mut message = Message::new(self.message.clone());
        message.context = self.context.clone();
        message.model = self.model.clone();
        message.temperature = self.temperature;
        message.max_tokens = self.max_tokens;
        message
    }
}

/// Relay one message and print the response
pub async fn send(args: SendArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let relay = super::build_relay(&config)?;
    let message = args.to_message();

    if !args.stream {
        return print_json(&relay.send_message(message).await?);
    }

    let mut chunks = relay.send_message_stream(message).await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = chunks.next().await {
        match chunk {
            StreamChunk::Content { content } => {
                write!(stdout, "{}", content)?;
                stdout.flush()?;
            }
            StreamChunk::End { model, usage } => {
                writeln!(stdout)?;
                eprintln!(
                    "[{}] {} tokens, ${:.6}",
                    model, usage.total_tokens, usage.estimated_cost
                );
            }
            StreamChunk::Error { message } => {
                writeln!(stdout)?;
                anyhow::bail!("stream failed: {}", message);
            }
        }
    }

    Ok(())
}

/// Print the responder's health
pub async fn health() -> anyhow::Result<()> {
    let relay = relay()?;
    print_json(&relay.check_health().await?)
}

/// Print the responder's model catalog
pub async fn models() -> anyhow::Result<()> {
    let relay = relay()?;
    print_json(&relay.list_models().await?)
}

fn relay() -> anyhow::Result<RelayService> {
    let config = super::bootstrap();
    super::build_relay(&config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
