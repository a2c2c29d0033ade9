use crate::config::PipelineConfig;
use crate::document::{RawRow, RawTable, TeamRef, team_header};
use crate::error::{ParseReport, Result, ScrapeError};
use crate::records::{PlayKind, PlayRecord};
use crate::text::{clock_to_minutes, split_play};
use crate::urls::stats_link_to_game_id;

const TIME_COL: usize = 0;
const TEAM1_COL: usize = 1;
const SCORE_COL: usize = 2;
const TEAM2_COL: usize = 3;

#[derive(Debug)]
pub struct PlayByPlay {
    pub game_id: Option<u64>,
    /// The summary table the teams were resolved from.
    pub header: RawTable,
    pub teams: [TeamRef; 2],
    pub plays: Vec<PlayRecord>,
    pub report: ParseReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InHalf { half: usize },
}

#[derive(Debug)]
enum Step {
    HalfBoundary,
    EmitPlay(PlayRecord),
    Reject(ScrapeError),
}

struct PlayMachine<'a> {
    state: State,
    teams: &'a [TeamRef; 2],
    game_id: Option<u64>,
    config: &'a PipelineConfig,
}

impl<'a> PlayMachine<'a> {
    fn new(teams: &'a [TeamRef; 2], game_id: Option<u64>, config: &'a PipelineConfig) -> Self {
        Self {
            state: State::InHalf { half: 0 },
            teams,
            game_id,
            config,
        }
    }

    fn step(&mut self, row: &RawRow) -> Step {
        let State::InHalf { half } = self.state;
        if row.text(SCORE_COL).is_empty() {
            self.state = State::InHalf { half: half + 1 };
            log::debug!("half boundary, entering period {}", half + 1);
            return Step::HalfBoundary;
        }
        match self.emit(row, half) {
            Ok(play) => Step::EmitPlay(play),
            Err(err) => Step::Reject(err),
        }
    }

    fn emit(&self, row: &RawRow, half: usize) -> Result<PlayRecord> {
        let team1 = row.text(TEAM1_COL);
        let team2 = row.text(TEAM2_COL);
        let (play_text, team_id) = match (team1.is_empty(), team2.is_empty()) {
            (false, true) => (team1, self.teams[0].team_id),
            (true, false) => (team2, self.teams[1].team_id),
            (true, true) => return Err(ScrapeError::parse("play row has no team text")),
            (false, false) => return Err(ScrapeError::parse("play row has text for both teams")),
        };

        let clock = clock_to_minutes(row.text(TIME_COL)).ok_or_else(|| {
            ScrapeError::parse(format!("bad clock {:?}", row.text(TIME_COL)))
        })?;
        let (away_score, home_score) = split_score(row.text(SCORE_COL))?;
        let text = split_play(play_text);

        Ok(PlayRecord {
            game_id: self.game_id,
            team_id,
            elapsed_time: clock + self.period_offset(half),
            first_name: text.first_name,
            last_name: text.last_name,
            play: PlayKind::from_description(&text.description),
            home_score,
            away_score,
        })
    }

    // Earlier periods stack under later ones so the clock grows across boundaries.
    fn period_offset(&self, half: usize) -> f64 {
        (0..half).map(|p| self.config.period_minutes(p)).sum()
    }
}

fn split_score(raw: &str) -> Result<(i64, i64)> {
    let (away, home) = raw
        .split_once('-')
        .ok_or_else(|| ScrapeError::parse(format!("bad score {raw:?}")))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|_| ScrapeError::parse(format!("bad score {raw:?}")))
    };
    Ok((parse(away)?, parse(home)?))
}

/// Runs the half-aware state machine over every play table after the header.
/// Malformed rows are dropped into the report; the rest of the game survives.
pub fn parse_play_by_play(
    tables: &[RawTable],
    url: &str,
    config: &PipelineConfig,
) -> Result<PlayByPlay> {
    let Some((header, play_tables)) = tables.split_first() else {
        return Err(ScrapeError::parse("play-by-play page has no tables"));
    };
    if play_tables.is_empty() {
        return Err(ScrapeError::parse("play-by-play page has no play tables"));
    }
    let teams = team_header(header)?;
    let game_id = stats_link_to_game_id(url);

    let mut machine = PlayMachine::new(&teams, game_id, config);
    let mut report = ParseReport::default();
    let mut plays = Vec::new();
    let mut boundaries = 0usize;

    // Each play table opens with its own column header row.
    let rows = play_tables.iter().flat_map(|t| t.rows.iter().skip(1));
    for (idx, row) in rows.enumerate() {
        report.rows_seen += 1;
        match machine.step(row) {
            Step::HalfBoundary => boundaries += 1,
            Step::EmitPlay(play) => plays.push(play),
            Step::Reject(err) => report.push(idx, err),
        }
    }

    let before = plays.len();
    // Clock-expired artifacts.
    plays.retain(|p| p.elapsed_time > 0.0);

    log::info!(
        "play-by-play game={game_id:?}: {} plays, {} boundaries, {} expired, {}",
        plays.len(),
        boundaries,
        before - plays.len(),
        report.summary()
    );
    Ok(PlayByPlay {
        game_id,
        header: header.clone(),
        teams,
        plays,
        report,
    })
}
