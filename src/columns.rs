use crate::error::{Result, ScrapeError};

/// Bumped whenever a canonical column is added or renamed.
pub const CANONICAL_SCHEMA_VERSION: u32 = 1;

/// Canonical box-score columns, independent of any page version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxColumn {
    Player,
    Position,
    Minutes,
    FieldGoalsMade,
    FieldGoalsAttempted,
    ThreeMade,
    ThreeAttempted,
    FreeThrowsMade,
    FreeThrowsAttempted,
    Points,
    OffensiveRebounds,
    DefensiveRebounds,
    TotalRebounds,
    Assists,
    Turnovers,
    Steals,
    Blocks,
    PersonalFouls,
    Dunks,
    TechnicalFouls,
}

impl BoxColumn {
    pub fn name(self) -> &'static str {
        match self {
            BoxColumn::Player => "Player",
            BoxColumn::Position => "Pos",
            BoxColumn::Minutes => "Min",
            BoxColumn::FieldGoalsMade => "FGM",
            BoxColumn::FieldGoalsAttempted => "FGA",
            BoxColumn::ThreeMade => "3FG",
            BoxColumn::ThreeAttempted => "3FGA",
            BoxColumn::FreeThrowsMade => "FT",
            BoxColumn::FreeThrowsAttempted => "FTA",
            BoxColumn::Points => "PTS",
            BoxColumn::OffensiveRebounds => "ORebs",
            BoxColumn::DefensiveRebounds => "DRebs",
            BoxColumn::TotalRebounds => "Tot Reb",
            BoxColumn::Assists => "AST",
            BoxColumn::Turnovers => "TO",
            BoxColumn::Steals => "STL",
            BoxColumn::Blocks => "BLKS",
            BoxColumn::PersonalFouls => "Fouls",
            BoxColumn::Dunks => "Dunks",
            BoxColumn::TechnicalFouls => "Tech Fouls",
        }
    }
}

// Every label variant observed across page versions, lower-cased.
const LABEL_VARIANTS: &[(&str, BoxColumn)] = &[
    ("player", BoxColumn::Player),
    ("name", BoxColumn::Player),
    ("pos", BoxColumn::Position),
    ("position", BoxColumn::Position),
    ("min", BoxColumn::Minutes),
    ("mp", BoxColumn::Minutes),
    ("minutes", BoxColumn::Minutes),
    ("fgm", BoxColumn::FieldGoalsMade),
    ("fg", BoxColumn::FieldGoalsMade),
    ("fga", BoxColumn::FieldGoalsAttempted),
    ("3fg", BoxColumn::ThreeMade),
    ("3fgm", BoxColumn::ThreeMade),
    ("3pm", BoxColumn::ThreeMade),
    ("3fga", BoxColumn::ThreeAttempted),
    ("3pa", BoxColumn::ThreeAttempted),
    ("ft", BoxColumn::FreeThrowsMade),
    ("ftm", BoxColumn::FreeThrowsMade),
    ("fta", BoxColumn::FreeThrowsAttempted),
    ("pts", BoxColumn::Points),
    ("points", BoxColumn::Points),
    ("orebs", BoxColumn::OffensiveRebounds),
    ("oreb", BoxColumn::OffensiveRebounds),
    ("off reb", BoxColumn::OffensiveRebounds),
    ("drebs", BoxColumn::DefensiveRebounds),
    ("dreb", BoxColumn::DefensiveRebounds),
    ("def reb", BoxColumn::DefensiveRebounds),
    ("tot reb", BoxColumn::TotalRebounds),
    ("reb", BoxColumn::TotalRebounds),
    ("rebs", BoxColumn::TotalRebounds),
    ("ast", BoxColumn::Assists),
    ("to", BoxColumn::Turnovers),
    ("tov", BoxColumn::Turnovers),
    ("stl", BoxColumn::Steals),
    ("st", BoxColumn::Steals),
    ("blk", BoxColumn::Blocks),
    ("blks", BoxColumn::Blocks),
    ("fouls", BoxColumn::PersonalFouls),
    ("pf", BoxColumn::PersonalFouls),
    ("dunks", BoxColumn::Dunks),
    ("tech fouls", BoxColumn::TechnicalFouls),
];

pub fn canonical_column(label: &str) -> Option<BoxColumn> {
    let key = label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    LABEL_VARIANTS
        .iter()
        .find(|(variant, _)| *variant == key)
        .map(|(_, col)| *col)
}

/// Maps raw header labels positionally to canonical columns.
/// Any unknown label fails the whole table; nothing is silently dropped.
pub fn normalize_columns<S: AsRef<str>>(labels: &[S]) -> Result<Vec<BoxColumn>> {
    let mut out = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.as_ref();
        match canonical_column(label) {
            Some(col) => {
                if out.contains(&col) {
                    return Err(ScrapeError::parse(format!(
                        "column {:?} appears twice in header",
                        col.name()
                    )));
                }
                out.push(col);
            }
            None => {
                log::warn!(
                    "schema drift: label {label:?} not in canonical mapping v{CANONICAL_SCHEMA_VERSION}"
                );
                return Err(ScrapeError::SchemaDrift {
                    label: label.to_string(),
                });
            }
        }
    }
    if !out.contains(&BoxColumn::Player) {
        return Err(ScrapeError::parse("box table header has no player column"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn old_and_new_labels_share_canonical_names() {
        assert_eq!(canonical_column("MIN"), Some(BoxColumn::Minutes));
        assert_eq!(canonical_column("Min"), Some(BoxColumn::Minutes));
        assert_eq!(canonical_column(" Tot  Reb "), Some(BoxColumn::TotalRebounds));
        assert_eq!(canonical_column("3FG"), Some(BoxColumn::ThreeMade));
    }

    #[test]
    fn unknown_label_is_schema_drift() {
        let err = normalize_columns(&["Player", "Min", "Hustle"]).unwrap_err();
        match err {
            ScrapeError::SchemaDrift { label } => assert_eq!(label, "Hustle"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn header_without_player_is_rejected() {
        assert!(matches!(
            normalize_columns(&["Min", "PTS"]),
            Err(ScrapeError::Parse(_))
        ));
    }
}
