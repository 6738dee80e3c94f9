mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use seed_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    let load_config = || match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match cli.command {
        cli::Commands::Rules(cmd) => commands::rules::handle(cmd, &load_config()?),
        cli::Commands::Concepts(cmd) => commands::concepts::handle(cmd, &load_config()?).await,
        cli::Commands::Publish { json } => commands::publish::handle(&load_config()?, json).await,
        cli::Commands::Completions { shell } => commands::completions::handle(shell),
    }
}
