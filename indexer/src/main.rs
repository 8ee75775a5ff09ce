use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use studyspot_core::analytics::write_report;
use studyspot_core::builder::{BuilderConfig, IndexBuilder};
use studyspot_core::merger::{merge_runs, remove_runs};
use studyspot_core::storage::{save_meta, IndexPaths, MetaFile, META_VERSION};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "studyspot-indexer")]
#[command(about = "Build and inspect the study-space room index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the room index from a directory of space JSON files
    Build {
        /// Directory of space records
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Documents per partial-run flush
        #[arg(long, default_value_t = 10_000)]
        batch_size: usize,
        /// Keep partial-run files after merging
        #[arg(long, default_value_t = false)]
        keep_runs: bool,
    },
    /// Re-summarize an existing index into index_report.txt
    Report {
        /// Index directory
        #[arg(long)]
        index: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, batch_size, keep_runs } => {
            build(&input, &output, batch_size, keep_runs)
        }
        Commands::Report { index } => {
            let paths = IndexPaths::new(&index);
            let meta = studyspot_core::storage::load_meta(&paths)?;
            let report = write_report(&paths, meta.num_docs)?;
            println!(
                "{} rooms, {} unique terms, {:.2} KB on disk",
                report.num_docs,
                report.unique_terms,
                report.bytes_on_disk as f64 / 1024.0
            );
            Ok(())
        }
    }
}

fn build(input: &PathBuf, output: &PathBuf, batch_size: usize, keep_runs: bool) -> Result<()> {
    let builder = IndexBuilder::create(output, BuilderConfig { batch_size })?;
    let stats = builder.build(input)?;

    let paths = IndexPaths::new(output);
    merge_runs(&paths, stats.num_runs)?;
    if !keep_runs {
        remove_runs(&paths, stats.num_runs)?;
    }

    save_meta(
        &paths,
        &MetaFile {
            num_docs: stats.num_docs,
            num_runs: stats.num_runs,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: META_VERSION,
        },
    )?;

    let report = write_report(&paths, stats.num_docs)?;
    tracing::info!(
        num_docs = stats.num_docs,
        num_runs = stats.num_runs,
        skipped_files = stats.skipped_files,
        unique_terms = report.unique_terms,
        "index build complete"
    );
    println!(
        "Indexed {} rooms across {} partial runs ({} unique terms, {:.2} KB).",
        stats.num_docs,
        stats.num_runs,
        report.unique_terms,
        report.bytes_on_disk as f64 / 1024.0
    );
    Ok(())
}
