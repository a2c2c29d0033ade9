use std::fs;
use std::path::PathBuf;

use cbb_scrape::batch_csv::{read_batch, write_batch};
use cbb_scrape::config::PipelineConfig;
use cbb_scrape::document::parse_document;
use cbb_scrape::pipeline::{PageSource, parse_schedule_page, process_documents};

const SCHEDULE_URL: &str = "http://stats.ncaa.org/team/index/11540?org_id=101";

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_schedule_fixture() {
    let doc = parse_document(&read_fixture("schedule.html"));
    let schedule = parse_schedule_page(SCHEDULE_URL, &doc, &PipelineConfig::default())
        .expect("fixture should parse");

    assert_eq!(schedule.team_id, Some(101));
    assert_eq!(schedule.games.len(), 3);
    assert_eq!(schedule.report.errors.len(), 1);

    let home = &schedule.games[0];
    assert_eq!(home.game_id, Some(3_512_345));
    assert_eq!((home.home_team_id, home.away_team_id), (Some(101), Some(102)));
    assert_eq!((home.home_score, home.away_score), (Some(70), Some(65)));
    assert_eq!(home.home_won, Some(true));

    let away = &schedule.games[1];
    assert_eq!((away.home_team_id, away.away_team_id), (Some(103), Some(101)));
    assert_eq!((away.home_score, away.away_score), (Some(72), Some(60)));
    assert_eq!(away.home_won, Some(true));
    assert_eq!(away.overtime_periods, 2);
    assert_eq!(away.opponent_label, "TeamC");

    let neutral = &schedule.games[2];
    assert!(neutral.neutral_site);
    assert_eq!(neutral.neutral_site_name.as_deref(), Some("Brooklyn, NY"));
    assert!(neutral.is_placeholder());
    assert!(!neutral.is_played());
}

#[test]
fn schedule_batch_survives_csv_interchange() {
    let pages = vec![PageSource::new(SCHEDULE_URL, read_fixture("schedule.html"))];
    let parsed = process_documents(&pages, &PipelineConfig::default(), parse_schedule_page);
    let games = parsed
        .into_iter()
        .next()
        .unwrap()
        .expect("fixture should parse")
        .games;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output.csv");
    write_batch(&path, &games).unwrap();
    assert_eq!(read_batch(&path).unwrap(), games);
}
