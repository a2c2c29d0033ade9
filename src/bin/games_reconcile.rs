use std::path::PathBuf;

use anyhow::{Context, Result};

use cbb_scrape::batch_csv;
use cbb_scrape::cli;
use cbb_scrape::config::PipelineConfig;
use cbb_scrape::gateway::SqliteGateway;
use cbb_scrape::pipeline;

const DEFAULT_BATCH: &str = "output.csv";

fn main() -> Result<()> {
    cli::init_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = PipelineConfig::from_env();

    let batch_path = cli::flag_value(&args, "--batch")
        .or_else(|| cli::positional(&args, &["--db", "--batch"]).into_iter().next())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BATCH));
    let scraped = batch_csv::read_batch(&batch_path)?;

    let db_path = cli::resolve_db_path(&args, &config)?;
    let mut gateway = SqliteGateway::open(&db_path)?;
    let rec = pipeline::reconcile_games(&mut gateway, &scraped)
        .with_context(|| format!("reconcile {}", batch_path.display()))?;

    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&rec.conflicts)?);
        return Ok(());
    }

    println!("Games reconcile complete");
    println!("DB: {}", db_path.display());
    println!("Batch: {} ({} games)", batch_path.display(), scraped.len());
    println!("Inserted: {}", rec.to_insert.len());
    println!("Updated: {}", rec.to_update.len());
    println!("Skipped: {}", rec.skipped.len());
    if !rec.conflicts.is_empty() {
        println!("Conflicts: {}", rec.conflicts.len());
        for conflict in rec.conflicts.iter().take(10) {
            println!(
                "   - {} {:?} vs {:?}: {}",
                conflict.scraped.date,
                conflict.scraped.home_team_id,
                conflict.scraped.away_team_id,
                conflict.reason
            );
        }
    }
    Ok(())
}
