use std::fs;
use std::path::PathBuf;

use cbb_scrape::config::PipelineConfig;
use cbb_scrape::document::parse_document;
use cbb_scrape::pipeline::parse_pbp_page;
use cbb_scrape::records::PlayKind;
use cbb_scrape::situational::annotate;

const PBP_URL: &str = "http://stats.ncaa.org/game/play_by_play/3512345";

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_play_by_play_fixture() {
    let doc = parse_document(&read_fixture("play_by_play.html"));
    let pbp = parse_pbp_page(PBP_URL, &doc, &PipelineConfig::default()).expect("fixture should parse");

    assert_eq!(pbp.game_id, Some(3_512_345));
    assert_eq!(pbp.teams[0].team_id, Some(101));
    assert_eq!(pbp.teams[1].team_id, Some(102));

    // Bad clock row is reported; the 00:00 row is an expired artifact.
    assert_eq!(pbp.report.errors.len(), 1);
    assert_eq!(pbp.plays.len(), 9);

    let first = &pbp.plays[0];
    assert_eq!(first.play, PlayKind::ThreeMade);
    assert_eq!(first.team_id, Some(101));
    assert_eq!(first.first_name.as_deref(), Some("JOHN"));
    assert_eq!(first.last_name.as_deref(), Some("SMITH"));
    assert_eq!(first.away_score, 3);
    assert_eq!(first.home_score, 0);

    let last = pbp.plays.last().unwrap();
    assert_eq!(last.play, PlayKind::ThreeMade);
    assert_eq!(last.team_id, Some(102));
    assert!((last.elapsed_time - 38.0).abs() < 1e-9);
}

#[test]
fn elapsed_time_decreases_within_each_half() {
    let doc = parse_document(&read_fixture("play_by_play.html"));
    let pbp = parse_pbp_page(PBP_URL, &doc, &PipelineConfig::default()).unwrap();

    let (first_half, second_half): (Vec<_>, Vec<_>) =
        pbp.plays.iter().partition(|p| p.elapsed_time <= 20.0);
    assert_eq!(first_half.len(), 7);
    assert_eq!(second_half.len(), 2);
    for half in [&first_half, &second_half] {
        for pair in half.windows(2) {
            assert!(pair[0].elapsed_time >= pair[1].elapsed_time);
        }
    }
    // The clock jumps upward at the boundary.
    assert!(second_half[0].elapsed_time > first_half[first_half.len() - 1].elapsed_time);
}

#[test]
fn annotation_pairs_same_clock_events() {
    let doc = parse_document(&read_fixture("play_by_play.html"));
    let pbp = parse_pbp_page(PBP_URL, &doc, &PipelineConfig::default()).unwrap();
    let annotated = annotate(&pbp.plays);

    assert_eq!(annotated.len(), pbp.plays.len());
    let layup = annotated
        .iter()
        .find(|a| a.play.play == PlayKind::LayupMade)
        .unwrap();
    assert!(layup.flags.assisted);
    let turnover = annotated
        .iter()
        .find(|a| a.play.play == PlayKind::Turnover)
        .unwrap();
    assert!(turnover.flags.stolen);
    assert!(annotated.windows(2).all(|w| w[0].seq < w[1].seq));

    let assist = annotated
        .iter()
        .find(|a| a.play.play == PlayKind::Assist)
        .unwrap();
    assert_eq!(assist.assist_play, Some(PlayKind::LayupMade));
    assert_eq!(assist.recipient.as_deref(), Some("JANE DOE"));
    assert_eq!(assist.possession, layup.possession);
    // Rebound at 19:18, layup at 19:05.
    assert!((layup.poss_time - 13.0 / 60.0).abs() < 1e-9);
    assert!(annotated.iter().all(|a| a.poss_time <= a.poss_time_full));
}
