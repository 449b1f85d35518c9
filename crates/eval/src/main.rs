//! Evaluation CLI for trademark clearance searches.
//!
//! Usage:
//!     eval search "NIKE" --classes 25 --candidates marks.json
//!     eval hash logo.png
//!     eval compare logo1.png logo2.png

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clearmark_explain::{summarize_conflict, summarize_search};
use clearmark_model::{MarkRecord, SearchQuery};
use clearmark_pipeline::{MatchService, MemorySource, PipelineConfig, SearchOptions};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "eval")]
#[command(about = "Evaluate trademark clearance searches")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a candidate file for conflicts with a mark
    Search {
        /// Mark text to search
        query: String,

        /// Nice classes (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        classes: Vec<u16>,

        /// JSON array of candidate mark records
        #[arg(long)]
        candidates: PathBuf,

        /// Maximum results
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Minimum overall similarity
        #[arg(long, default_value = "40")]
        floor: u8,

        /// Perceptual hash (hex) of the query logo
        #[arg(long)]
        logo_hash: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Print the perceptual hash of an image
    Hash {
        image: PathBuf,
    },

    /// Compare two logos
    Compare {
        first: PathBuf,
        second: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clearmark=debug".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            query,
            classes,
            candidates,
            limit,
            floor,
            logo_hash,
            format,
        } => {
            let config = PipelineConfig {
                relevance_floor: floor,
                max_results: limit,
                ..Default::default()
            };
            run_search(&query, classes, logo_hash, &candidates, config, format).await?;
        }
        Commands::Hash { image } => run_hash(&image)?,
        Commands::Compare { first, second } => run_compare(&first, &second)?,
    }

    Ok(())
}

fn load_candidates(path: &Path) -> Result<Vec<MarkRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading candidates from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

async fn run_search(
    mark_text: &str,
    classes: Vec<u16>,
    logo_hash: Option<String>,
    candidates: &Path,
    config: PipelineConfig,
    format: Format,
) -> Result<()> {
    let mut query = SearchQuery::new(mark_text, classes)?;
    if let Some(hash) = logo_hash {
        query = query.with_logo_hash(hash);
    }

    let records = load_candidates(candidates)?;
    tracing::info!(candidates = records.len(), "Loaded candidate file");

    let service = MatchService::new(MemorySource::new(records))
        .without_cache()
        .with_config(config);
    let outcome = service.search(&query, SearchOptions::default()).await?;

    if let Format::Json = format {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("Searching for: {}", query.mark_text());
    println!("Classes: {:?}", query.classes());
    println!("---");

    for (i, conflict) in outcome.conflicts.iter().enumerate() {
        println!(
            "\n{}. {} (Serial: {})",
            i + 1,
            conflict.record.text,
            conflict.record.serial_id
        );
        println!("   Status: {}", conflict.record.status.as_str());
        println!(
            "   Exact {} | Visual {} | Sound {} | Fuzzy {}",
            conflict.breakdown.exact,
            conflict.breakdown.visual,
            conflict.breakdown.phonetic,
            conflict.breakdown.fuzzy
        );
        println!("   {}", summarize_conflict(conflict));
        println!("   {}", conflict.risk.explanation);
        if let Some(logo) = conflict.logo_similarity {
            println!("   Logo similarity: {}%", logo);
        }
        println!("   Evidence: {}", conflict.record.evidence_url());
    }

    println!("\n---");
    println!("{}", summarize_search(&outcome.summary));
    println!(
        "Showing {} of {} ({} ms)",
        outcome.conflicts.len(),
        outcome.summary.total,
        outcome.metadata.duration_ms
    );

    Ok(())
}

fn run_hash(path: &Path) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let hash = clearmark_imaging::hash(&data)?;
    println!("{}", hash);
    Ok(())
}

fn run_compare(first: &Path, second: &Path) -> Result<()> {
    let a = std::fs::read(first).with_context(|| format!("reading {}", first.display()))?;
    let b = std::fs::read(second).with_context(|| format!("reading {}", second.display()))?;
    println!("Logo similarity: {}%", clearmark_imaging::compare_images(&a, &b));
    Ok(())
}
