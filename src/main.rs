use ai_relay::cli::{self, Cli, Command};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Responder => cli::responder::run().await,
        Command::Forwarder => cli::forwarder::run().await,
        Command::Send(args) => cli::client::send(args).await,
        Command::Health => cli::client::health().await,
        Command::Models => cli::client::models().await,
    }
}
