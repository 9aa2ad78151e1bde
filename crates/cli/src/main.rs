//! adlens CLI - drive the analysis server and manage saved results
//!
//! The caller side of the pipeline: submit a media file to a running
//! analysis server, persist the returned result locally, and browse or
//! prune what has been saved.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::analyze::AnalyzeCommand;
use commands::results::ResultsCommand;

#[derive(Parser)]
#[command(
    name = "adlens",
    version,
    about = "Analyze ad media and generate copy",
    long_about = "Submit a video or image to an adlens analysis server and keep the\n\
                  results in a local store for later browsing.",
    after_help = "EXAMPLES:\n  \
                  # Analyze a video and save the result locally\n  \
                  adlens analyze demo.mp4\n\n  \
                  # Analyze against a remote server, overriding the MIME type\n  \
                  adlens analyze photo --server http://ads.example.com:8080 --mime image/png\n\n  \
                  # Browse and prune saved results\n  \
                  adlens results list\n  \
                  adlens results delete <ID>\n  \
                  adlens results clear"
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
    /// Submit a media file for analysis and save the result locally
    Analyze(AnalyzeCommand),

    /// Manage locally saved analysis results
    Results(ResultsCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Analyze(cmd) => cmd.execute().await,
        Commands::Results(cmd) => cmd.execute().await,
    }
}
