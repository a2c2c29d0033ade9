use chrono::NaiveDate;

use crate::document::{RawRow, RawTable};
use crate::error::{ParseReport, Result, ScrapeError};
use crate::records::GameRecord;
use crate::text::{Location, parse_opponent, parse_outcome};
use crate::urls::{game_link_to_game_id, url_to_team_id};

#[derive(Debug)]
pub struct Schedule {
    pub team_id: Option<u64>,
    pub games: Vec<GameRecord>,
    pub report: ParseReport,
}

/// One team's schedule page: a title row, a header row, then
/// `date | opponent | outcome` rows.
pub fn extract_schedule(tables: &[RawTable], url: &str) -> Result<Schedule> {
    let table = tables
        .first()
        .ok_or_else(|| ScrapeError::parse("schedule page has no table"))?;
    let team_id = url_to_team_id(url);
    if team_id.is_none() {
        log::warn!("no team id in schedule url {url}");
    }

    let mut games = Vec::new();
    let mut report = ParseReport::default();
    for (idx, row) in table.rows.iter().enumerate().skip(2) {
        report.rows_seen += 1;
        if row.cells.len() != 3 {
            report.push(
                idx,
                ScrapeError::parse(format!("schedule row has {} cells", row.cells.len())),
            );
            continue;
        }
        match schedule_row(row, team_id) {
            Ok(game) => games.push(game),
            Err(err) => report.push(idx, err),
        }
    }

    log::info!(
        "schedule team={team_id:?}: {} games ({})",
        games.len(),
        report.summary()
    );
    Ok(Schedule {
        team_id,
        games,
        report,
    })
}

fn schedule_row(row: &RawRow, team_id: Option<u64>) -> Result<GameRecord> {
    let date = parse_date(row.text(0))?;

    let opp_cell = row.cell(1).cloned().unwrap_or_default();
    let opp_id = opp_cell.href.as_deref().and_then(url_to_team_id);
    let opponent = parse_opponent(&opp_cell.text);
    let (home_team_id, away_team_id) = match opponent.location {
        Location::Away => (opp_id, team_id),
        // Neutral games keep the page's team as home; the flag carries the rest.
        Location::Home | Location::Neutral => (team_id, opp_id),
    };

    let outcome_cell = row.cell(2).cloned().unwrap_or_default();
    let game_id = outcome_cell.href.as_deref().and_then(game_link_to_game_id);
    let outcome = parse_outcome(&outcome_cell.text);

    let (home_score, away_score) = match (outcome, opponent.location) {
        (Some(o), Location::Away) => (Some(o.opp_score), Some(o.team_score)),
        (Some(o), _) => (Some(o.team_score), Some(o.opp_score)),
        (None, _) => (None, None),
    };
    let home_won = match (home_score, away_score) {
        (Some(h), Some(a)) => Some(h > a),
        _ => None,
    };

    Ok(GameRecord {
        game_id,
        date,
        home_team_id,
        away_team_id,
        opponent_label: opponent.name,
        neutral_site: opponent.location == Location::Neutral,
        neutral_site_name: opponent.neutral_site,
        home_won,
        overtime_periods: outcome.map(|o| o.overtime_periods).unwrap_or(0),
        home_score,
        away_score,
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    let token = raw.split_whitespace().next().unwrap_or("");
    NaiveDate::parse_from_str(token, "%m/%d/%Y")
        .map_err(|err| ScrapeError::parse(format!("bad schedule date {raw:?}: {err}")))
}
