use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ndarray::ArrayView1;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use kinesis_core::SimilarityStore;
use kinesis_pipeline::imu::{self, ParseReport};
use kinesis_pipeline::ingest::ingest_features;
use kinesis_pipeline::{ParseMode, PipelineConfig, FEATURE_DIMENSION};

#[derive(Parser)]
#[command(name = "kinesis")]
#[command(about = "Index and query recorded IMU motion data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse recordings and report how many samples were read
    Inspect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Fail on the first malformed record
        #[arg(long)]
        strict: bool,
    },
    /// Index every sample in a directory by its raw features and save the store
    Index {
        /// Directory of `*.js` recordings (defaults to KINESIS_DATA_PATH)
        dir: Option<PathBuf>,
        /// Base path for the saved store (defaults to KINESIS_STORE_PATH)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        strict: bool,
    },
    /// Print the size of a saved store
    Stats { path: Option<PathBuf> },
    /// Find the stored samples nearest to a feature vector
    Query {
        path: Option<PathBuf>,
        /// Comma-separated components, e.g. `10.5,-2,90,0.1,0.2,0.3,1,2,3,30`
        #[arg(long, required = true, value_delimiter = ',', allow_hyphen_values = true)]
        vector: Vec<f32>,
        #[arg(short, long)]
        k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("kinesis_pipeline=info".parse()?)
                .add_directive("kinesis_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env().context("invalid KINESIS_* environment")?;

    match cli.command {
        Command::Inspect { files, strict } => inspect(&files, parse_mode(&config, strict)),
        Command::Index { dir, out, strict } => {
            let mode = parse_mode(&config, strict);
            let dir = dir.unwrap_or(config.data_path);
            let out = out.unwrap_or(config.store_path);
            index(&dir, &out, mode)
        }
        Command::Stats { path } => stats(&path.unwrap_or(config.store_path)),
        Command::Query { path, vector, k } => {
            let k = k.unwrap_or(config.top_k);
            query(&path.unwrap_or(config.store_path), &vector, k)
        }
    }
}

fn parse_mode(config: &PipelineConfig, strict: bool) -> ParseMode {
    if strict {
        ParseMode::Strict
    } else {
        config.parse_mode
    }
}

fn inspect(files: &[PathBuf], mode: ParseMode) -> Result<()> {
    let mut samples = 0;
    let mut skipped = 0;
    for file in files {
        let report: ParseReport =
            imu::load_file(file, mode).with_context(|| format!("failed to parse {}", file.display()))?;
        println!("{}: {} samples, {} skipped", file.display(), report.samples.len(), report.skipped_count());
        for line in &report.skipped {
            println!("  line {}: {}", line.line, line.reason);
        }
        samples += report.samples.len();
        skipped += report.skipped_count();
    }
    if files.len() > 1 {
        println!("total: {} samples, {} skipped", samples, skipped);
    }
    Ok(())
}

fn index(dir: &Path, out: &Path, mode: ParseMode) -> Result<()> {
    let report = imu::load_directory(dir, mode).with_context(|| format!("failed to load {}", dir.display()))?;
    if report.samples.is_empty() {
        bail!("no samples found in {}", dir.display());
    }
    let mut store = SimilarityStore::with_dimension(FEATURE_DIMENSION)?;
    let added = ingest_features(&mut store, &report.samples)?;
    store.save(out).with_context(|| format!("failed to save store to {}", out.display()))?;
    info!(added, skipped = report.skipped_count(), out = ?out, "Index written");
    println!("indexed {} samples ({} skipped) into {}", added, report.skipped_count(), out.display());
    Ok(())
}

fn stats(path: &Path) -> Result<()> {
    let store = SimilarityStore::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    println!("vectors: {}", store.len());
    println!("dimension: {}", store.dimension());
    println!("documents: {}", store.document_count());
    Ok(())
}

fn query(path: &Path, vector: &[f32], k: usize) -> Result<()> {
    let store = SimilarityStore::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let hits = store.search(ArrayView1::from(vector), k)?;
    for hit in &hits {
        println!("{}", serde_json::to_string(hit)?);
    }
    Ok(())
}
