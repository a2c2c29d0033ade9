use anyhow::{Context, Result, anyhow};

use cbb_scrape::cli::{self, PageInput};
use cbb_scrape::config::PipelineConfig;
use cbb_scrape::error::ScrapeError;
use cbb_scrape::gateway::{Collection, SqliteGateway};
use cbb_scrape::pipeline;
use cbb_scrape::urls::StatsPage;

fn main() -> Result<()> {
    cli::init_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = PipelineConfig::from_env();

    let db_path = cli::resolve_db_path(&args, &config)?;
    let mut gateway = SqliteGateway::open(&db_path)?;

    let mut inputs = cli::positional(&args, &["--db", "--missing"])
        .iter()
        .map(|raw| PageInput::parse(raw))
        .collect::<Vec<_>>();
    let missing = cli::missing_limit(&args)?;
    if let Some(limit) = missing {
        let urls = pipeline::games_to_scrape(&gateway, Collection::PlayByPlay, StatsPage::PlayByPlay, limit)?;
        inputs.extend(urls.into_iter().map(|url| PageInput::Remote { url }));
    }
    if inputs.is_empty() {
        if missing.is_some() {
            println!("Nothing to scrape");
            return Ok(());
        }
        return Err(anyhow!(
            "usage: pbp_ingest [--db <path>] [--missing <n>] <url=page.html | url | page.html>..."
        ));
    }

    let (pages, load_errors) = cli::load_pages(&inputs);
    let parsed = pipeline::process_documents(&pages, &config, pipeline::parse_pbp_page);

    println!("Play-by-play ingest");
    println!("DB: {}", db_path.display());
    let mut games = 0usize;
    let mut failed = Vec::new();
    for (page, result) in pages.iter().zip(parsed) {
        match result.and_then(|pbp| pipeline::store_play_by_play(&mut gateway, pbp)) {
            Ok(ingest) => {
                games += 1;
                println!(
                    "game {}: raw={} annotated={} ({})",
                    ingest.game_id,
                    ingest.raw_rows,
                    ingest.annotated_rows,
                    ingest.report.summary()
                );
                for row_err in ingest.report.errors.iter().take(5) {
                    println!("   - row {}: {}", row_err.row_index, row_err.error);
                }
            }
            Err(ScrapeError::Persistence(err)) => {
                return Err(err).with_context(|| format!("write plays for {}", page.url));
            }
            Err(err) => failed.push(format!("{}: {err}", page.url)),
        }
    }

    println!("Games written: {games}/{}", inputs.len());
    let errors = load_errors.iter().chain(failed.iter()).collect::<Vec<_>>();
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(10) {
            println!("   - {err}");
        }
    }
    Ok(())
}
