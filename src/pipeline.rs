use rayon::prelude::*;
use scraper::Html;

use crate::box_score::{BoxScore, BoxVerdict, build_box_score};
use crate::config::PipelineConfig;
use crate::document::{PageKind, locate_tables, parse_document};
use crate::error::{ParseReport, Result, ScrapeError};
use crate::gateway::{Collection, Gateway};
use crate::play_by_play::{PlayByPlay, parse_play_by_play};
use crate::reconcile::{Reconciliation, reconcile};
use crate::records::GameRecord;
use crate::sanitize::sanitize_records;
use crate::schedule::{Schedule, extract_schedule};
use crate::situational::annotate;
use crate::urls::{StatsPage, stats_link};

/// A fetched page and the URL it came from.
#[derive(Debug, Clone)]
pub struct PageSource {
    pub url: String,
    pub html: String,
}

impl PageSource {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

pub fn parse_box_page(url: &str, doc: &Html, config: &PipelineConfig) -> Result<BoxScore> {
    let tables = locate_tables(doc, &config.table_marker, PageKind::BoxScore)?;
    build_box_score(&tables, url)
}

pub fn parse_pbp_page(url: &str, doc: &Html, config: &PipelineConfig) -> Result<PlayByPlay> {
    let tables = locate_tables(doc, &config.table_marker, PageKind::PlayByPlay)?;
    parse_play_by_play(&tables, url, config)
}

pub fn parse_schedule_page(url: &str, doc: &Html, config: &PipelineConfig) -> Result<Schedule> {
    let tables = locate_tables(doc, &config.table_marker, PageKind::Schedule)?;
    extract_schedule(&tables, url)
}

/// Parses every page on a bounded worker pool. Results keep input order;
/// one bad page never affects its neighbours.
pub fn process_documents<T, F>(pages: &[PageSource], config: &PipelineConfig, parse: F) -> Vec<Result<T>>
where
    T: Send,
    F: Fn(&str, &Html, &PipelineConfig) -> Result<T> + Sync,
{
    let pool = build_parse_pool(config.parse_parallelism);
    with_parse_pool(&pool, || {
        pages
            .par_iter()
            .map(|page| {
                // Html is not Send; each worker builds its own tree.
                let doc = parse_document(&page.html);
                parse(&page.url, &doc, config)
            })
            .collect()
    })
}

fn build_parse_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .ok()
}

fn with_parse_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxIngest {
    Stored { game_id: u64, rows: usize },
    /// Failed the validity gate; queued for a later retry instead of persisted.
    Queued { game_id: u64, reason: String },
}

/// Gates, sanitizes and writes one box score. Existing rows for the game are
/// replaced so a re-scrape never duplicates players.
pub fn store_box_score<G: Gateway>(gateway: &mut G, score: &BoxScore, config: &PipelineConfig) -> Result<BoxIngest> {
    let game_id = score
        .game_id
        .ok_or_else(|| ScrapeError::parse("box score has no game id"))?;

    if let BoxVerdict::Invalid(reason) = score.validate(&config.box_validity) {
        log::warn!("game {game_id}: {}", ScrapeError::Validation(reason.clone()));
        gateway.queue_retry(game_id, &reason)?;
        return Ok(BoxIngest::Queued { game_id, reason });
    }

    let rows = sanitize_records(&score.player_rows());
    let rows = gateway.replace_rows(Collection::BoxStats, game_id, &rows)?;
    Ok(BoxIngest::Stored { game_id, rows })
}

#[derive(Debug)]
pub struct PbpIngest {
    pub game_id: u64,
    pub raw_rows: usize,
    pub annotated_rows: usize,
    pub report: ParseReport,
}

/// Writes the raw play mirror and the annotated plays for one game. Both
/// land together or neither does.
pub fn store_play_by_play<G: Gateway>(gateway: &mut G, pbp: PlayByPlay) -> Result<PbpIngest> {
    let game_id = pbp
        .game_id
        .ok_or_else(|| ScrapeError::parse("play-by-play has no game id"))?;

    let raw = sanitize_records(&pbp.plays);
    let annotated = sanitize_records(&annotate(&pbp.plays));
    let counts = gateway.replace_game_rows(
        game_id,
        &[(Collection::RawPlayByPlay, &raw), (Collection::PlayByPlay, &annotated)],
    )?;
    let (raw_rows, annotated_rows) = match counts.as_slice() {
        [raw_rows, annotated_rows] => (*raw_rows, *annotated_rows),
        _ => (0, 0),
    };
    Ok(PbpIngest {
        game_id,
        raw_rows,
        annotated_rows,
        report: pbp.report,
    })
}

/// Diffs a scraped batch against the stored games and applies the result.
/// Conflicts are returned, never written.
pub fn reconcile_games<G: Gateway>(gateway: &mut G, scraped: &[GameRecord]) -> Result<Reconciliation> {
    let snapshot = gateway.load_games()?;
    let rec = reconcile(scraped, &snapshot);
    if !rec.to_update.is_empty() {
        gateway.update_games(&sanitize_records(&rec.to_update))?;
    }
    if !rec.to_insert.is_empty() {
        gateway.insert_games(&sanitize_records(&rec.to_insert))?;
    }
    Ok(rec)
}

/// Stats links for played games that still have no rows in `collection`.
pub fn games_to_scrape<G: Gateway>(
    gateway: &G,
    collection: Collection,
    page: StatsPage,
    limit: usize,
) -> Result<Vec<String>> {
    let ids = gateway.games_missing(collection, limit)?;
    log::info!("{} games missing from {}", ids.len(), collection.table());
    Ok(ids.into_iter().map(|id| stats_link(id, page)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_keep_input_order() {
        let pages = (0..12)
            .map(|i| PageSource::new(format!("page-{i}"), format!("<p>{i}</p>")))
            .collect::<Vec<_>>();
        let config = PipelineConfig {
            parse_parallelism: 3,
            ..PipelineConfig::default()
        };
        let out = process_documents(&pages, &config, |url, _doc, _cfg| {
            if url.ends_with('5') {
                Err(ScrapeError::parse("boom"))
            } else {
                Ok(url.to_string())
            }
        });
        assert_eq!(out.len(), 12);
        assert!(out[5].is_err());
        assert_eq!(out[11].as_ref().unwrap(), "page-11");
        assert_eq!(out[0].as_ref().unwrap(), "page-0");
    }

    #[test]
    fn page_without_marker_tables_is_parse_error() {
        let doc = parse_document("<html><body><table><tr><td>x</td></tr></table></body></html>");
        let err = parse_box_page("/game/box_score/1", &doc, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse(_)));
    }
}
