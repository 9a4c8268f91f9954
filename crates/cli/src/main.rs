//! digestr CLI — the main entry point.
//!
//! Commands:
//! - `run`      — Fetch posts and generate a digest
//! - `prompts`  — List prompt templates
//! - `onboard`  — Initialize config and a sample channel list
//! - `doctor`   — Diagnose configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "digestr",
    about = "digestr — channel digests with map-reduce LLM summarization",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a digest for a date range
    Run(commands::run::RunArgs),

    /// List the available prompt templates
    Prompts,

    /// Initialize configuration and a sample channel list
    Onboard,

    /// Diagnose configuration
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run(args) => commands::run::run(args).await?,
        Commands::Prompts => commands::prompts::run().await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
