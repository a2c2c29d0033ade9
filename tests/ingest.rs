use std::fs;
use std::path::PathBuf;

use cbb_scrape::config::PipelineConfig;
use cbb_scrape::document::parse_document;
use cbb_scrape::gateway::{Collection, Gateway, SqliteGateway};
use cbb_scrape::pipeline::{
    BoxIngest, games_to_scrape, parse_box_page, parse_pbp_page, parse_schedule_page, reconcile_games,
    store_box_score, store_play_by_play,
};
use cbb_scrape::urls::StatsPage;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn temp_gateway() -> (tempfile::TempDir, SqliteGateway) {
    let dir = tempfile::tempdir().unwrap();
    let gateway = SqliteGateway::open(&dir.path().join("cbb.sqlite")).unwrap();
    (dir, gateway)
}

#[test]
fn box_ingest_replaces_rows_on_rescrape() {
    let (_dir, mut gateway) = temp_gateway();
    let config = PipelineConfig::default();
    let doc = parse_document(&read_fixture("box_score.html"));
    let score = parse_box_page("/game/box_score/3512345", &doc, &config).unwrap();

    for _ in 0..2 {
        let outcome = store_box_score(&mut gateway, &score, &config).unwrap();
        assert_eq!(
            outcome,
            BoxIngest::Stored {
                game_id: 3_512_345,
                rows: 3
            }
        );
    }
    assert_eq!(gateway.count_rows(Collection::BoxStats).unwrap(), 3);
}

#[test]
fn invalid_box_is_queued_not_persisted() {
    let (_dir, mut gateway) = temp_gateway();
    let config = PipelineConfig::default();
    let doc = parse_document(&read_fixture("box_score_partial.html"));
    let score = parse_box_page("/game/box_score/3512345", &doc, &config).unwrap();

    let outcome = store_box_score(&mut gateway, &score, &config).unwrap();
    assert!(matches!(outcome, BoxIngest::Queued { game_id: 3_512_345, .. }));
    assert_eq!(gateway.count_rows(Collection::BoxStats).unwrap(), 0);
}

#[test]
fn play_by_play_writes_raw_and_annotated_rows() {
    let (_dir, mut gateway) = temp_gateway();
    let config = PipelineConfig::default();
    let doc = parse_document(&read_fixture("play_by_play.html"));
    let pbp = parse_pbp_page("/game/play_by_play/3512345", &doc, &config).unwrap();

    let ingest = store_play_by_play(&mut gateway, pbp).unwrap();
    assert_eq!(ingest.game_id, 3_512_345);
    assert_eq!(ingest.raw_rows, 9);
    assert_eq!(ingest.annotated_rows, 9);
    assert_eq!(ingest.report.errors.len(), 1);
    assert_eq!(gateway.count_rows(Collection::RawPlayByPlay).unwrap(), 9);
    assert_eq!(gateway.count_rows(Collection::PlayByPlay).unwrap(), 9);
}

#[test]
fn schedule_games_reconcile_once() {
    let (_dir, mut gateway) = temp_gateway();
    let config = PipelineConfig::default();
    let doc = parse_document(&read_fixture("schedule.html"));
    let schedule = parse_schedule_page(
        "http://stats.ncaa.org/team/index/11540?org_id=101",
        &doc,
        &config,
    )
    .unwrap();

    let first = reconcile_games(&mut gateway, &schedule.games).unwrap();
    assert_eq!(first.to_insert.len(), 3);
    assert_eq!(gateway.load_games().unwrap().len(), 3);

    let second = reconcile_games(&mut gateway, &schedule.games).unwrap();
    assert!(second.is_noop());
    assert_eq!(gateway.load_games().unwrap(), schedule.games);

    // Played games still lacking box rows, newest first.
    assert_eq!(
        gateway.games_missing(Collection::BoxStats, 10).unwrap(),
        vec![3_512_399, 3_512_345]
    );
}

#[test]
fn unscraped_games_become_stats_links() {
    let (_dir, mut gateway) = temp_gateway();
    let config = PipelineConfig::default();
    let doc = parse_document(&read_fixture("schedule.html"));
    let schedule = parse_schedule_page(
        "http://stats.ncaa.org/team/index/11540?org_id=101",
        &doc,
        &config,
    )
    .unwrap();
    reconcile_games(&mut gateway, &schedule.games).unwrap();

    let doc = parse_document(&read_fixture("play_by_play.html"));
    let pbp = parse_pbp_page("/game/play_by_play/3512345", &doc, &config).unwrap();
    store_play_by_play(&mut gateway, pbp).unwrap();

    assert_eq!(
        games_to_scrape(&gateway, Collection::PlayByPlay, StatsPage::PlayByPlay, 10).unwrap(),
        vec!["http://stats.ncaa.org/game/play_by_play/3512399".to_string()]
    );
    assert_eq!(
        games_to_scrape(&gateway, Collection::BoxStats, StatsPage::BoxScore, 1).unwrap(),
        vec!["http://stats.ncaa.org/game/box_score/3512399".to_string()]
    );
}
