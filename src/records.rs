use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::sanitize::{ToRow, Value};

/// Orientation-sensitive identity of a game before it has a `game_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameKey {
    pub date: NaiveDate,
    pub home_team_id: Option<u64>,
    pub away_team_id: Option<u64>,
}

impl GameKey {
    pub fn swapped(self) -> Self {
        Self {
            date: self.date,
            home_team_id: self.away_team_id,
            away_team_id: self.home_team_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: Option<u64>,
    pub date: NaiveDate,
    pub home_team_id: Option<u64>,
    pub away_team_id: Option<u64>,
    pub opponent_label: String,
    pub neutral_site: bool,
    pub neutral_site_name: Option<String>,
    /// `None` until the game has been played.
    pub home_won: Option<bool>,
    pub overtime_periods: u32,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

impl GameRecord {
    pub fn key(&self) -> GameKey {
        GameKey {
            date: self.date,
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
        }
    }

    /// Persisted rows without a `game_id` are unplayed placeholders.
    pub fn is_placeholder(&self) -> bool {
        self.game_id.is_none()
    }

    pub fn is_played(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    /// A scrape with neither a `game_id` nor a final score says nothing
    /// beyond the schedule.
    pub fn carries_outcome(&self) -> bool {
        self.game_id.is_some() || self.is_played()
    }

    /// Same game seen from the other team's page.
    pub fn swapped(&self) -> Self {
        Self {
            home_team_id: self.away_team_id,
            away_team_id: self.home_team_id,
            home_score: self.away_score,
            away_score: self.home_score,
            home_won: self.home_won.map(|won| !won),
            ..self.clone()
        }
    }

    /// Fields a scrape can correct on an existing placeholder.
    pub fn same_outcome(&self, other: &GameRecord) -> bool {
        self.game_id == other.game_id
            && self.home_score == other.home_score
            && self.away_score == other.away_score
            && self.home_won == other.home_won
            && self.overtime_periods == other.overtime_periods
    }

    pub fn outcome_code(&self) -> Option<&'static str> {
        self.home_won.map(|won| if won { "W" } else { "L" })
    }
}

impl ToRow for GameRecord {
    const COLUMNS: &'static [&'static str] = &[
        "game_id",
        "dt",
        "hteam_id",
        "ateam_id",
        "opp_string",
        "neutral",
        "neutral_site",
        "home_outcome",
        "numot",
        "home_score",
        "away_score",
    ];

    fn to_row(&self) -> Vec<Value> {
        vec![
            self.game_id.into(),
            self.date.into(),
            self.home_team_id.into(),
            self.away_team_id.into(),
            self.opponent_label.clone().into(),
            self.neutral_site.into(),
            self.neutral_site_name.clone().into(),
            self.home_won.into(),
            i64::from(self.overtime_periods).into(),
            self.home_score.into(),
            self.away_score.into(),
        ]
    }
}

pub const TOTALS_LABEL: &str = "Totals";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxStatRecord {
    pub game_id: Option<u64>,
    pub team_id: Option<u64>,
    pub team_label: String,
    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,
    pub minutes: i64,
    pub field_goals_made: Option<i64>,
    pub field_goals_attempted: Option<i64>,
    pub three_pointers_made: Option<i64>,
    pub three_pointers_attempted: Option<i64>,
    pub free_throws_made: Option<i64>,
    pub free_throws_attempted: Option<i64>,
    pub points: Option<i64>,
    pub offensive_rebounds: Option<i64>,
    pub defensive_rebounds: Option<i64>,
    pub total_rebounds: Option<i64>,
    pub assists: Option<i64>,
    pub turnovers: Option<i64>,
    pub steals: Option<i64>,
    pub blocks: Option<i64>,
    pub personal_fouls: Option<i64>,
}

impl BoxStatRecord {
    /// The synthetic per-team sum row.
    pub fn is_totals(&self) -> bool {
        self.first_name == TOTALS_LABEL
    }
}

impl ToRow for BoxStatRecord {
    const COLUMNS: &'static [&'static str] = &[
        "game_id",
        "team",
        "team_id",
        "first_name",
        "last_name",
        "pos",
        "min",
        "fgm",
        "fga",
        "tpm",
        "tpa",
        "ftm",
        "fta",
        "pts",
        "oreb",
        "dreb",
        "reb",
        "ast",
        "turnover",
        "stl",
        "blk",
        "pf",
    ];

    fn to_row(&self) -> Vec<Value> {
        vec![
            self.game_id.into(),
            self.team_label.clone().into(),
            self.team_id.into(),
            self.first_name.clone().into(),
            self.last_name.clone().into(),
            self.position.clone().into(),
            self.minutes.into(),
            self.field_goals_made.into(),
            self.field_goals_attempted.into(),
            self.three_pointers_made.into(),
            self.three_pointers_attempted.into(),
            self.free_throws_made.into(),
            self.free_throws_attempted.into(),
            self.points.into(),
            self.offensive_rebounds.into(),
            self.defensive_rebounds.into(),
            self.total_rebounds.into(),
            self.assists.into(),
            self.turnovers.into(),
            self.steals.into(),
            self.blocks.into(),
            self.personal_fouls.into(),
        ]
    }
}

/// Controlled vocabulary for play-by-play descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayKind {
    ThreeMade,
    ThreeMissed,
    JumperMade,
    JumperMissed,
    LayupMade,
    LayupMissed,
    DunkMade,
    DunkMissed,
    TipInMade,
    TipInMissed,
    FreeThrowMade,
    FreeThrowMissed,
    OffensiveRebound,
    DefensiveRebound,
    DeadballRebound,
    Assist,
    Turnover,
    Steal,
    Block,
    Foul,
    Timeout,
    Other,
}

impl PlayKind {
    pub fn from_description(raw: &str) -> Self {
        let text = raw.trim().to_ascii_lowercase();
        let made = text.contains("made");
        let missed = text.contains("missed");
        let shot = |made_kind, missed_kind| {
            if made {
                Some(made_kind)
            } else if missed {
                Some(missed_kind)
            } else {
                None
            }
        };

        let kind = if text.contains("three point") || text.contains("3pt") {
            shot(PlayKind::ThreeMade, PlayKind::ThreeMissed)
        } else if text.contains("free throw") {
            shot(PlayKind::FreeThrowMade, PlayKind::FreeThrowMissed)
        } else if text.contains("layup") {
            shot(PlayKind::LayupMade, PlayKind::LayupMissed)
        } else if text.contains("dunk") {
            shot(PlayKind::DunkMade, PlayKind::DunkMissed)
        } else if text.contains("tip in") || text.contains("tip-in") {
            shot(PlayKind::TipInMade, PlayKind::TipInMissed)
        } else if text.contains("jumper") || text.contains("two point") {
            shot(PlayKind::JumperMade, PlayKind::JumperMissed)
        } else if text.contains("offensive rebound") {
            Some(PlayKind::OffensiveRebound)
        } else if text.contains("defensive rebound") {
            Some(PlayKind::DefensiveRebound)
        } else if text.contains("deadball rebound") {
            Some(PlayKind::DeadballRebound)
        } else if text.contains("assist") {
            Some(PlayKind::Assist)
        } else if text.contains("turnover") {
            Some(PlayKind::Turnover)
        } else if text.contains("steal") {
            Some(PlayKind::Steal)
        } else if text.contains("block") {
            Some(PlayKind::Block)
        } else if text.contains("foul") {
            Some(PlayKind::Foul)
        } else if text.contains("timeout") {
            Some(PlayKind::Timeout)
        } else {
            None
        };

        kind.unwrap_or_else(|| {
            log::debug!("unmapped play description {raw:?}");
            PlayKind::Other
        })
    }

    pub fn code(self) -> &'static str {
        match self {
            PlayKind::ThreeMade => "FG3M",
            PlayKind::ThreeMissed => "FG3A",
            PlayKind::JumperMade => "JMPM",
            PlayKind::JumperMissed => "JMPA",
            PlayKind::LayupMade => "LAYM",
            PlayKind::LayupMissed => "LAYA",
            PlayKind::DunkMade => "DNKM",
            PlayKind::DunkMissed => "DNKA",
            PlayKind::TipInMade => "TIPM",
            PlayKind::TipInMissed => "TIPA",
            PlayKind::FreeThrowMade => "FTM",
            PlayKind::FreeThrowMissed => "FTA",
            PlayKind::OffensiveRebound => "OREB",
            PlayKind::DefensiveRebound => "DREB",
            PlayKind::DeadballRebound => "DBREB",
            PlayKind::Assist => "AST",
            PlayKind::Turnover => "TO",
            PlayKind::Steal => "STL",
            PlayKind::Block => "BLK",
            PlayKind::Foul => "PF",
            PlayKind::Timeout => "TMO",
            PlayKind::Other => "OTHER",
        }
    }

    pub fn points(self) -> i64 {
        match self {
            PlayKind::ThreeMade => 3,
            PlayKind::JumperMade | PlayKind::LayupMade | PlayKind::DunkMade | PlayKind::TipInMade => 2,
            PlayKind::FreeThrowMade => 1,
            _ => 0,
        }
    }

    pub fn is_made_field_goal(self) -> bool {
        matches!(
            self,
            PlayKind::ThreeMade
                | PlayKind::JumperMade
                | PlayKind::LayupMade
                | PlayKind::DunkMade
                | PlayKind::TipInMade
        )
    }

    pub fn is_missed_field_goal(self) -> bool {
        matches!(
            self,
            PlayKind::ThreeMissed
                | PlayKind::JumperMissed
                | PlayKind::LayupMissed
                | PlayKind::DunkMissed
                | PlayKind::TipInMissed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub game_id: Option<u64>,
    pub team_id: Option<u64>,
    pub elapsed_time: f64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub play: PlayKind,
    pub home_score: i64,
    pub away_score: i64,
}

impl PlayRecord {
    pub fn same_player(&self, other: &PlayRecord) -> bool {
        self.team_id == other.team_id
            && self.last_name.is_some()
            && self.first_name == other.first_name
            && self.last_name == other.last_name
    }
}

impl ToRow for PlayRecord {
    const COLUMNS: &'static [&'static str] = &[
        "game_id",
        "team_id",
        "time",
        "first_name",
        "last_name",
        "play",
        "hscore",
        "ascore",
    ];

    fn to_row(&self) -> Vec<Value> {
        vec![
            self.game_id.into(),
            self.team_id.into(),
            self.elapsed_time.into(),
            self.first_name.clone().into(),
            self.last_name.clone().into(),
            self.play.code().into(),
            self.home_score.into(),
            self.away_score.into(),
        ]
    }
}

/// Derived situational context for a play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationFlags {
    pub second_chance: bool,
    pub and_one: bool,
    pub blocked: bool,
    pub stolen: bool,
    pub assisted: bool,
    pub charge: bool,
    pub timeout_points: bool,
    pub turnover_points: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPlay {
    pub seq: u32,
    pub possession: u32,
    /// Minutes into the current possession at this play.
    pub poss_time: f64,
    /// Length of the whole possession this play belongs to.
    pub poss_time_full: f64,
    /// Team fouls so far in the half, this play included.
    pub home_fouls: u32,
    pub away_fouls: u32,
    pub play: PlayRecord,
    pub flags: SituationFlags,
    /// Set on assists: the shot that was assisted and who made it.
    pub assist_play: Option<PlayKind>,
    pub recipient: Option<String>,
}

impl ToRow for AnnotatedPlay {
    const COLUMNS: &'static [&'static str] = &[
        "game_id",
        "pbp_id",
        "team_id",
        "time",
        "first_name",
        "last_name",
        "play",
        "hscore",
        "ascore",
        "possession",
        "poss_time_full",
        "poss_time",
        "home_fouls",
        "away_fouls",
        "second_chance",
        "timeout_pts",
        "turnover_pts",
        "and_one",
        "blocked",
        "stolen",
        "assisted",
        "assist_play",
        "recipient",
        "charge",
    ];

    fn to_row(&self) -> Vec<Value> {
        let p = &self.play;
        vec![
            p.game_id.into(),
            i64::from(self.seq).into(),
            p.team_id.into(),
            p.elapsed_time.into(),
            p.first_name.clone().into(),
            p.last_name.clone().into(),
            p.play.code().into(),
            p.home_score.into(),
            p.away_score.into(),
            i64::from(self.possession).into(),
            self.poss_time_full.into(),
            self.poss_time.into(),
            i64::from(self.home_fouls).into(),
            i64::from(self.away_fouls).into(),
            self.flags.second_chance.into(),
            self.flags.timeout_points.into(),
            self.flags.turnover_points.into(),
            self.flags.and_one.into(),
            self.flags.blocked.into(),
            self.flags.stolen.into(),
            self.flags.assisted.into(),
            self.assist_play.map(PlayKind::code).into(),
            self.recipient.clone().into(),
            self.flags.charge.into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_descriptions_map_to_vocabulary() {
        assert_eq!(
            PlayKind::from_description("made Three Point Jumper"),
            PlayKind::ThreeMade
        );
        assert_eq!(
            PlayKind::from_description("missed Two Point Jumper"),
            PlayKind::JumperMissed
        );
        assert_eq!(PlayKind::from_description("made Layup"), PlayKind::LayupMade);
        assert_eq!(
            PlayKind::from_description("missed Free Throw"),
            PlayKind::FreeThrowMissed
        );
        assert_eq!(
            PlayKind::from_description("Offensive Rebound"),
            PlayKind::OffensiveRebound
        );
        assert_eq!(PlayKind::from_description("Blocked Shot"), PlayKind::Block);
        assert_eq!(PlayKind::from_description("Commits Foul"), PlayKind::Foul);
        assert_eq!(PlayKind::from_description("30 Second Timeout"), PlayKind::Timeout);
        assert_eq!(PlayKind::from_description("Enters Game"), PlayKind::Other);
    }

    #[test]
    fn swapped_game_flips_orientation_only() {
        let game = GameRecord {
            game_id: Some(9),
            date: NaiveDate::from_ymd_opt(2014, 1, 5).unwrap(),
            home_team_id: Some(101),
            away_team_id: Some(102),
            opponent_label: "B".into(),
            neutral_site: false,
            neutral_site_name: None,
            home_won: Some(true),
            overtime_periods: 1,
            home_score: Some(70),
            away_score: Some(65),
        };
        let swapped = game.swapped();
        assert_eq!(swapped.home_team_id, Some(102));
        assert_eq!(swapped.home_score, Some(65));
        assert_eq!(swapped.home_won, Some(false));
        assert_eq!(swapped.overtime_periods, 1);
        assert_eq!(swapped.swapped(), game);
        assert_eq!(game.key().swapped(), swapped.key());
    }
}
