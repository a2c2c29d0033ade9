use std::path::PathBuf;

use anyhow::{Result, anyhow};

use cbb_scrape::batch_csv;
use cbb_scrape::cli::{self, PageInput};
use cbb_scrape::config::PipelineConfig;
use cbb_scrape::pipeline;

const DEFAULT_OUT: &str = "output.csv";

fn main() -> Result<()> {
    cli::init_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = PipelineConfig::from_env();

    let inputs = cli::positional(&args, &["--out"])
        .iter()
        .map(|raw| PageInput::parse(raw))
        .collect::<Vec<_>>();
    if inputs.is_empty() {
        return Err(anyhow!(
            "usage: schedule_scrape [--out <batch.csv>] <url=page.html | url | page.html>..."
        ));
    }
    let out = cli::flag_value(&args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT));

    let (pages, mut errors) = cli::load_pages(&inputs);
    let parsed = pipeline::process_documents(&pages, &config, pipeline::parse_schedule_page);

    let mut games = Vec::new();
    let mut parsed_pages = 0usize;
    let mut dropped_rows = 0usize;
    for (page, result) in pages.iter().zip(parsed) {
        match result {
            Ok(schedule) => {
                parsed_pages += 1;
                dropped_rows += schedule.report.errors.len();
                games.extend(schedule.games);
            }
            Err(err) => errors.push(format!("{}: {err}", page.url)),
        }
    }
    batch_csv::write_batch(&out, &games)?;

    println!("Schedule scrape complete");
    println!("Batch: {}", out.display());
    println!("Pages: {parsed_pages}/{}", inputs.len());
    println!("Games: {} (rows dropped: {dropped_rows})", games.len());
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(10) {
            println!("   - {err}");
        }
    }
    Ok(())
}
