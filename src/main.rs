use anyhow::{Context, Result};
use clap::Parser;
use shiprate::{cli::StoreArgs, schema::DuplicatePolicy, Ingestor};
use std::{path::PathBuf, time::Instant};
use tracing::{info, warn};

/// Load a transcribed shipping-rate table into DuckDB
#[derive(Parser, Debug)]
#[command(name = "shiprate")]
struct Args {
    /// CSV transcript (Markdown fences are tolerated)
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// What to do with keys that are already stored: fail, ignore or replace
    #[arg(long, default_value = "fail")]
    on_duplicate: DuplicatePolicy,

    #[command(flatten)]
    store: StoreArgs,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    dotenvy::dotenv().ok();
    shiprate::cli::init_logging();
    let args = Args::parse();
    info!("startup");

    // ─── 2) resolve store config ─────────────────────────────────────
    let config = args.store.to_config().context("resolving store config")?;
    info!(
        db = %config.database.display(),
        table = %config.table,
        policy = ?args.on_duplicate,
        "store configured"
    );

    // ─── 3) ingest ───────────────────────────────────────────────────
    let start = Instant::now();
    let report = Ingestor::new(config)
        .context("building ingestor")?
        .with_duplicate_policy(args.on_duplicate)
        .ingest_file(&args.input)
        .with_context(|| format!("ingesting {}", args.input.display()))?;
    info!(elapsed = ?start.elapsed(), "ingested");

    // ─── 4) report ───────────────────────────────────────────────────
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.skipped.is_empty() {
        warn!(skipped = report.skipped.len(), "some rows were malformed and skipped");
    }

    info!("all done");
    Ok(())
}
