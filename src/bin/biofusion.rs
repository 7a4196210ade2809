//! biofusion command-line entry point.
//!
//! ```bash
//! # Fuse the configured sources and write the bulk-load file set
//! biofusion run --config data/config.json
//!
//! # Same, into another directory under the output root, without MONDO augmentation
//! biofusion run --config data/config.json --output-dir nightly --no-augment
//!
//! # Fuse and print the report without exporting
//! biofusion stats --config data/config.json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use biofusion::{
    load_sources_parallel, BulkExporter, CrossVocabularyTable, FusionConfig, FusionPipeline,
    FusionReport, StoreStats,
};

/// Entity-resolving fusion of biomedical reference graphs
#[derive(Parser, Debug)]
#[command(name = "biofusion")]
#[command(author, version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fuse all sources and write the bulk export
    Run {
        /// Run configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Export directory, relative to the configured output root
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Skip cross-vocabulary augmentation even if a mapping is configured
        #[arg(long)]
        no_augment: bool,
    },

    /// Fuse all sources and print the report without exporting
    Stats {
        /// Run configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Skip cross-vocabulary augmentation even if a mapping is configured
        #[arg(long)]
        no_augment: bool,
    },
}

#[derive(Serialize)]
struct StatsOutput {
    report: FusionReport,
    store: StoreStats,
}

fn fuse(config: &FusionConfig, no_augment: bool) -> anyhow::Result<FusionPipeline> {
    let graphs = load_sources_parallel(&config.sources).context("failed to load source graphs")?;
    info!(sources = graphs.len(), "source graphs parsed");

    let mapping = match (&config.mapping, no_augment) {
        (Some(mapping), false) => Some(
            CrossVocabularyTable::from_paths(&mapping.lookup, &mapping.reverse_lookup)
                .context("failed to load cross-vocabulary table")?,
        ),
        _ => None,
    };

    let mut pipeline = FusionPipeline::new();
    pipeline
        .run(&graphs, mapping.as_ref())
        .context("fusion failed")?;
    Ok(pipeline)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            no_augment,
        } => {
            let mut config = FusionConfig::from_path(&config)
                .with_context(|| format!("invalid configuration {}", config.display()))?;
            if let Some(dir) = output_dir {
                config.export.output_dir = dir;
                config = config.validate().context("invalid --output-dir")?;
            }

            let pipeline = fuse(&config, no_augment)?;
            let report = pipeline.report();
            let summary = BulkExporter::new(config.export.clone(), config.loader.clone())
                .export(pipeline.store())
                .context("export failed")?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            println!(
                "exported {} nodes and {} relationships to {}",
                summary.node_rows,
                summary.relationship_rows,
                summary.output_dir.display()
            );
        }
        Commands::Stats { config, no_augment } => {
            let config = FusionConfig::from_path(&config)
                .with_context(|| format!("invalid configuration {}", config.display()))?;
            let pipeline = fuse(&config, no_augment)?;
            let output = StatsOutput {
                report: pipeline.report(),
                store: pipeline.store().stats(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
