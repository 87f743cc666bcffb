//! Markovify CLI Module
//!
//! Command-line interface for building next-action datasets from raw
//! exports and for scoring the majority-class baseline on them.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use crate::config::MarkovifyConfig;
use crate::model::{cross_val_accuracy, MajorityClass};
use crate::pipeline::{FeatureSet, Markovify};

#[derive(Parser)]
#[command(name = "markovify")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Session next-action feature pipeline")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the feature matrix from raw session and device files
    Featurize {
        /// Raw session-event file (headerless CSV)
        #[arg(short, long)]
        sessions: PathBuf,

        /// Raw device file (headerless CSV)
        #[arg(short, long)]
        devices: PathBuf,

        /// Markov order: events of context per row, at least 1
        #[arg(long, default_value = "1")]
        order: usize,

        /// Held-out fraction of sessions in [0, 1]; 0 keeps everything
        #[arg(long, default_value = "0.0")]
        subset: f64,

        /// Seed for session sampling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Build the dataset and cross-validate the majority-class baseline
    Score {
        /// Raw session-event file (headerless CSV)
        #[arg(short, long)]
        sessions: PathBuf,

        /// Raw device file (headerless CSV)
        #[arg(short, long)]
        devices: PathBuf,

        /// Markov order: events of context per row, at least 1
        #[arg(long, default_value = "1")]
        order: usize,

        /// Held-out fraction of sessions in [0, 1]; 0 keeps everything
        #[arg(long, default_value = "0.0")]
        subset: f64,

        /// Number of cross-validation folds
        #[arg(long, default_value = "5")]
        folds: usize,

        /// Seed for sampling and fold shuffling
        #[arg(long)]
        seed: Option<u64>,
    },
}

pub fn cmd_featurize(
    sessions: &PathBuf,
    devices: &PathBuf,
    order: usize,
    subset: f64,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let set = build_dataset(sessions, devices, order, subset, seed)?;

    println!();
    println!("  {:<16} {}", "Rows", set.n_rows());
    println!("  {:<16} {}", "Features", set.n_features());
    println!();
    println!("  First feature columns:");
    for name in set.feature_names.iter().take(12) {
        println!("    {name}");
    }
    if set.feature_names.len() > 12 {
        println!("    ... and {} more", set.feature_names.len() - 12);
    }
    println!();
    Ok(())
}

pub fn cmd_score(
    sessions: &PathBuf,
    devices: &PathBuf,
    order: usize,
    subset: f64,
    folds: usize,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let set = build_dataset(sessions, devices, order, subset, seed)?;

    print!("  Scoring majority-class baseline... ");
    let start = Instant::now();
    let results = cross_val_accuracy(&MajorityClass::new(), &set.x, &set.y, folds, seed)?;
    println!("done in {:?}", start.elapsed());

    println!();
    println!("  {:<16} {}", "Rows", set.n_rows());
    println!("  {:<16} {}", "Features", set.n_features());
    println!("  {:<16} {:.4}", "Mean accuracy", results.mean_score);
    println!("  {:<16} {:.4}", "Std deviation", results.std_score);
    println!("  {:<16} {}", "Folds", results.n_folds);
    println!();
    Ok(())
}

fn build_dataset(
    sessions: &PathBuf,
    devices: &PathBuf,
    order: usize,
    subset: f64,
    seed: Option<u64>,
) -> anyhow::Result<FeatureSet> {
    let mut config = MarkovifyConfig::new().with_order(order).with_subset(subset);
    if let Some(seed) = seed {
        config = config.with_random_state(seed);
    }
    let mut pipeline = Markovify::new(config)?;

    print!("  Building dataset... ");
    let start = Instant::now();
    let set = pipeline.run(sessions, devices)?;
    println!("done in {:?}", start.elapsed());
    Ok(set)
}
