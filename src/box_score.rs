use crate::columns::{BoxColumn, normalize_columns};
use crate::config::BoxValidityPolicy;
use crate::document::{RawRow, RawTable, TeamRef, team_header};
use crate::error::{Result, ScrapeError};
use crate::records::BoxStatRecord;
use crate::text::{clean_text, parse_minutes, parse_name, strip_noise};
use crate::urls::stats_link_to_game_id;

/// Combined box score for both teams, `Totals` rows included.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxScore {
    pub game_id: Option<u64>,
    pub teams: [TeamRef; 2],
    pub rows: Vec<BoxStatRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxVerdict {
    Valid,
    /// Expected to recur on partially rendered pages; retry later.
    Invalid(String),
}

impl BoxVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, BoxVerdict::Valid)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            BoxVerdict::Valid => Ok(()),
            BoxVerdict::Invalid(reason) => Err(ScrapeError::Validation(reason)),
        }
    }
}

impl BoxScore {
    pub fn totals(&self) -> impl Iterator<Item = &BoxStatRecord> {
        self.rows.iter().filter(|r| r.is_totals())
    }

    pub fn validate(&self, policy: &BoxValidityPolicy) -> BoxVerdict {
        let totals = self.totals().collect::<Vec<_>>();
        if totals.len() != policy.required_totals_rows {
            return BoxVerdict::Invalid(format!(
                "expected {} Totals rows, found {}",
                policy.required_totals_rows,
                totals.len()
            ));
        }
        let scoring = totals
            .iter()
            .filter(|t| t.points.is_some_and(|p| p > policy.min_team_points))
            .count();
        if scoring != policy.required_totals_rows {
            let points = totals.iter().map(|t| t.points).collect::<Vec<_>>();
            return BoxVerdict::Invalid(format!(
                "team points {points:?} not all above {}",
                policy.min_team_points
            ));
        }
        BoxVerdict::Valid
    }

    /// Rows destined for persistence.
    pub fn player_rows(&self) -> Vec<BoxStatRecord> {
        self.rows.iter().filter(|r| !r.is_totals()).cloned().collect()
    }
}

/// Builds the canonical box score from the header table and the two team tables.
pub fn build_box_score(tables: &[RawTable], url: &str) -> Result<BoxScore> {
    let [header, first, second] = tables else {
        return Err(ScrapeError::parse(format!(
            "box score needs 3 tables, got {}",
            tables.len()
        )));
    };
    if header.rows.len() != 3 {
        return Err(ScrapeError::parse(format!(
            "bad box header: expected 3 rows, found {}",
            header.rows.len()
        )));
    }
    let teams = team_header(header)?;
    let game_id = stats_link_to_game_id(url);
    if game_id.is_none() {
        log::warn!("no game id in box score url {url}");
    }

    let mut rows = team_rows(first, &teams[0], game_id)?;
    rows.extend(team_rows(second, &teams[1], game_id)?);

    log::debug!(
        "box score game={game_id:?}: {} rows for {} / {}",
        rows.len(),
        teams[0].label,
        teams[1].label
    );
    Ok(BoxScore {
        game_id,
        teams,
        rows,
    })
}

// Row 0 is the team title, row 1 the column labels.
fn team_rows(table: &RawTable, team: &TeamRef, game_id: Option<u64>) -> Result<Vec<BoxStatRecord>> {
    let labels_row = table
        .rows
        .get(1)
        .ok_or_else(|| ScrapeError::parse(format!("box table for {} has no header", team.label)))?;
    let labels = labels_row
        .cells
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>();
    let columns = normalize_columns(&labels)?;

    let mut out = Vec::new();
    for (idx, row) in table.rows.iter().enumerate().skip(2) {
        if row.cells.len() > columns.len() {
            return Err(ScrapeError::parse(format!(
                "box row {idx} for {} has {} cells, header has {}",
                team.label,
                row.cells.len(),
                columns.len()
            )));
        }
        if let Some(record) = build_row(row, &columns, team, game_id) {
            out.push(record);
        }
    }
    Ok(out)
}

fn build_row(
    row: &RawRow,
    columns: &[BoxColumn],
    team: &TeamRef,
    game_id: Option<u64>,
) -> Option<BoxStatRecord> {
    let mut record = BoxStatRecord {
        game_id,
        team_id: team.team_id,
        team_label: team.label.clone(),
        ..BoxStatRecord::default()
    };
    let mut has_player = false;

    for (col, cell) in columns.iter().zip(row.cells.iter()) {
        let raw = cell.text.as_str();
        match col {
            BoxColumn::Player => {
                let name = clean_text(raw);
                if name.is_empty() {
                    continue;
                }
                has_player = true;
                let (first, last) = parse_name(&name);
                record.first_name = first;
                record.last_name = last;
            }
            BoxColumn::Position => {
                record.position = Some(clean_text(raw)).filter(|s| !s.is_empty());
            }
            BoxColumn::Minutes => record.minutes = parse_minutes(raw),
            numeric => {
                let value = coerce_numeric(raw);
                if let Some(slot) = numeric_slot(&mut record, *numeric) {
                    *slot = value;
                }
            }
        }
    }

    // Sub-total artifacts carry no player name.
    has_player.then_some(record)
}

/// Empty cells are null; non-numeric leftovers are null as well.
fn coerce_numeric(raw: &str) -> Option<i64> {
    let cleaned = strip_noise(raw);
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(n) = cleaned.parse::<i64>() {
        return Some(n);
    }
    match cleaned.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => {
            log::debug!("non-numeric box cell {raw:?}");
            None
        }
    }
}

fn numeric_slot(record: &mut BoxStatRecord, col: BoxColumn) -> Option<&mut Option<i64>> {
    let slot = match col {
        BoxColumn::FieldGoalsMade => &mut record.field_goals_made,
        BoxColumn::FieldGoalsAttempted => &mut record.field_goals_attempted,
        BoxColumn::ThreeMade => &mut record.three_pointers_made,
        BoxColumn::ThreeAttempted => &mut record.three_pointers_attempted,
        BoxColumn::FreeThrowsMade => &mut record.free_throws_made,
        BoxColumn::FreeThrowsAttempted => &mut record.free_throws_attempted,
        BoxColumn::Points => &mut record.points,
        BoxColumn::OffensiveRebounds => &mut record.offensive_rebounds,
        BoxColumn::DefensiveRebounds => &mut record.defensive_rebounds,
        BoxColumn::TotalRebounds => &mut record.total_rebounds,
        BoxColumn::Assists => &mut record.assists,
        BoxColumn::Turnovers => &mut record.turnovers,
        BoxColumn::Steals => &mut record.steals,
        BoxColumn::Blocks => &mut record.blocks,
        BoxColumn::PersonalFouls => &mut record.personal_fouls,
        // Known labels with no persisted column.
        BoxColumn::Dunks | BoxColumn::TechnicalFouls => return None,
        BoxColumn::Player | BoxColumn::Position | BoxColumn::Minutes => return None,
    };
    Some(slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cells_drop_noise() {
        assert_eq!(coerce_numeric("12*"), Some(12));
        assert_eq!(coerce_numeric("-"), None);
        assert_eq!(coerce_numeric(""), None);
        assert_eq!(coerce_numeric("4/"), Some(4));
        assert_eq!(coerce_numeric("7.0"), Some(7));
        assert_eq!(coerce_numeric("DNP"), None);
    }

    fn totals(points: Option<i64>) -> BoxStatRecord {
        BoxStatRecord {
            first_name: "Totals".to_string(),
            points,
            ..BoxStatRecord::default()
        }
    }

    fn score(rows: Vec<BoxStatRecord>) -> BoxScore {
        BoxScore {
            game_id: Some(1),
            teams: [TeamRef::default(), TeamRef::default()],
            rows,
        }
    }

    #[test]
    fn validity_gate_needs_two_scoring_totals() {
        let policy = BoxValidityPolicy::default();
        assert!(score(vec![totals(Some(70)), totals(Some(65))]).validate(&policy).is_valid());
        assert!(!score(vec![totals(Some(70))]).validate(&policy).is_valid());
        assert!(!score(vec![totals(Some(70)), totals(Some(5))]).validate(&policy).is_valid());
        assert!(!score(vec![totals(Some(70)), totals(None)]).validate(&policy).is_valid());

        let lenient = BoxValidityPolicy {
            required_totals_rows: 2,
            min_team_points: 0,
        };
        assert!(score(vec![totals(Some(70)), totals(Some(5))]).validate(&lenient).is_valid());
    }

    #[test]
    fn invalid_verdict_maps_to_validation_error() {
        let verdict = BoxVerdict::Invalid("placeholder".into());
        assert!(matches!(verdict.into_result(), Err(ScrapeError::Validation(_))));
    }
}
