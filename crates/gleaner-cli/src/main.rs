//! Gleaner CLI - Command-line interface for the Gleaner knowledge graph extractor.

use clap::Parser;
use gleaner_cli::commands;
use gleaner_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr so stdout stays machine readable)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> gleaner_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Create formatter
    let formatter = Formatter::new(cli.format, !cli.no_color);

    match cli.command {
        Command::Init(args) => commands::execute_init(args, &formatter),
        Command::Chunk(args) => {
            let config = Config::load(cli.config.as_deref())?;
            commands::execute_chunk(args, &config, &formatter)
        }
        Command::Extract(args) => {
            let config = Config::load(cli.config.as_deref())?;
            commands::execute_extract(args, &config, &formatter).await
        }
    }
}
