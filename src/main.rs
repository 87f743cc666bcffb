//! Markovify - Main Entry Point
//!
//! Batch feature-construction tool for session next-action prediction.

use clap::Parser;
use markovify::cli::{cmd_featurize, cmd_score, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "markovify=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Featurize { sessions, devices, order, subset, seed } => {
            cmd_featurize(&sessions, &devices, order, subset, seed)?;
        }
        Commands::Score { sessions, devices, order, subset, folds, seed } => {
            cmd_score(&sessions, &devices, order, subset, folds, seed)?;
        }
    }

    Ok(())
}
