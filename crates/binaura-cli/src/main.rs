//! Binaura CLI - Command-line interface for binaural carrier tracking.

mod commands;
mod format;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "binaura")]
#[command(author, version, about = "Binaural beat and isochronic pulse analyzer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track carrier pairs, beats and pulses in a stereo WAV file
    Analyze(commands::analyze::AnalyzeArgs),

    /// Display WAV file metadata
    Info(commands::info::InfoArgs),

    /// Show or check analysis configuration files
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so stdout stays clean for reports
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
