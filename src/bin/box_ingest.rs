use anyhow::{Context, Result, anyhow};

use cbb_scrape::cli::{self, PageInput};
use cbb_scrape::config::PipelineConfig;
use cbb_scrape::error::ScrapeError;
use cbb_scrape::gateway::{Collection, SqliteGateway};
use cbb_scrape::pipeline::{self, BoxIngest};
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
        let urls = pipeline::games_to_scrape(&gateway, Collection::BoxStats, StatsPage::BoxScore, limit)?;
        inputs.extend(urls.into_iter().map(|url| PageInput::Remote { url }));
    }
    if inputs.is_empty() {
        if missing.is_some() {
            println!("Nothing to scrape");
            return Ok(());
        }
        return Err(anyhow!(
            "usage: box_ingest [--db <path>] [--missing <n>] <url=page.html | url | page.html>..."
        ));
    }

    let (pages, load_errors) = cli::load_pages(&inputs);
    let parsed = pipeline::process_documents(&pages, &config, pipeline::parse_box_page);

    let mut stored = 0usize;
    let mut rows = 0usize;
    let mut queued = Vec::new();
    let mut failed = Vec::new();
    for (page, result) in pages.iter().zip(parsed) {
        let outcome =
            result.and_then(|score| pipeline::store_box_score(&mut gateway, &score, &config));
        match outcome {
            Ok(BoxIngest::Stored { game_id, rows: n }) => {
                log::info!("game {game_id}: stored {n} player rows");
                stored += 1;
                rows += n;
            }
            Ok(BoxIngest::Queued { game_id, reason }) => {
                queued.push(format!("{game_id}: {reason}"));
            }
            Err(ScrapeError::Persistence(err)) => {
                return Err(err).with_context(|| format!("write box score for {}", page.url));
            }
            Err(err) => failed.push(format!("{}: {err}", page.url)),
        }
    }

    println!("Box ingest complete");
    println!("DB: {}", db_path.display());
    println!("Pages: {}/{}", pages.len(), inputs.len());
    println!("Games stored: {stored} ({rows} rows)");
    println!("Queued for retry: {}", queued.len());
    for item in queued.iter().take(10) {
        println!("   - {item}");
    }
    let errors = load_errors.iter().chain(failed.iter()).collect::<Vec<_>>();
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(10) {
            println!("   - {err}");
        }
    }
    Ok(())
}
