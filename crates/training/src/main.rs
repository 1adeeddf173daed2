//! Vitals Risk Model Trainer - Main Entry Point

use anyhow::Context;
use clap::Parser;
use inference_engine::ForestConfig;
use std::path::PathBuf;
use storage::ArtifactStore;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use training::{DatasetSource, SyntheticConfig, TrainingPipeline};

#[derive(Debug, Parser)]
#[command(name = "train-model", version, about = "Train the vital-sign risk classifier")]
struct Args {
    /// Tabular vitals dataset (CSV)
    #[arg(long, default_value = "human_vital_signs_dataset_2024.csv")]
    dataset: PathBuf,

    /// Directory receiving scaler.bin and risk_classifier.bin
    #[arg(long, default_value = "artifacts")]
    artifact_dir: PathBuf,

    /// Number of trees
    #[arg(long, default_value_t = 100)]
    trees: usize,

    /// Maximum tree depth
    #[arg(long, default_value_t = 10)]
    max_depth: usize,

    /// Forest and synthetic data seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Skip the dataset and train on synthetic clusters
    #[arg(long)]
    synthetic: bool,

    /// Synthetic sample count
    #[arg(long, default_value_t = 200)]
    samples: usize,

    /// Fail instead of generating synthetic data when the dataset is missing
    #[arg(long)]
    no_fallback: bool,
}

fn init_logging() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = Args::parse();

    info!("=== Vitals Risk Trainer v{} ===", env!("CARGO_PKG_VERSION"));

    let synthetic = SyntheticConfig {
        samples: args.samples,
        seed: args.seed,
    };
    let pipeline = TrainingPipeline {
        forest: ForestConfig {
            n_trees: args.trees,
            max_depth: args.max_depth,
            seed: args.seed,
            ..Default::default()
        },
        synthetic: synthetic.clone(),
    };
    let source = if args.synthetic {
        DatasetSource::Synthetic(synthetic)
    } else {
        DatasetSource::Csv {
            path: args.dataset,
            fallback_to_synthetic: !args.no_fallback,
        }
    };

    let store = ArtifactStore::new(args.artifact_dir);
    let (models, meta) = pipeline
        .train_and_save(&source, &store)
        .context("Training failed")?;

    let report = &models.report;
    info!(
        "Generation {}: {} rows, accuracy {:.2}%, classes {:?}",
        meta.generation,
        report.samples,
        report.accuracy * 100.0,
        report.classes
    );
    println!(
        "{}",
        serde_json::to_string_pretty(report).context("Failed to render report")?
    );

    Ok(())
}
