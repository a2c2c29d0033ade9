use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::ScrapeError;
use crate::records::{GameKey, GameRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub scraped: GameRecord,
    pub candidates: Vec<GameRecord>,
    pub reason: String,
}

impl Conflict {
    pub fn to_error(&self) -> ScrapeError {
        ScrapeError::ReconciliationConflict {
            date: self.scraped.date.to_string(),
            detail: self.reason.clone(),
        }
    }
}

/// Disjoint partition of a scraped batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub to_insert: Vec<GameRecord>,
    /// Placeholders with the scraped outcome written on, in the persisted orientation.
    pub to_update: Vec<GameRecord>,
    pub skipped: Vec<GameRecord>,
    /// Excluded from automatic writes; needs manual resolution.
    pub conflicts: Vec<Conflict>,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty()
    }
}

/// First record wins for every repeated `game_id`; records without one are kept.
pub fn dedup_by_game_id(batch: &[GameRecord]) -> Vec<GameRecord> {
    let mut seen = HashSet::new();
    batch
        .iter()
        .filter(|g| g.game_id.is_none_or(|id| seen.insert(id)))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Direct,
    Swapped,
}

struct SnapshotIndex {
    by_game_id: HashMap<u64, usize>,
    direct: HashMap<GameKey, Vec<usize>>,
    swapped: HashMap<GameKey, Vec<usize>>,
}

impl SnapshotIndex {
    fn build(persisted: &[GameRecord]) -> Self {
        let mut by_game_id = HashMap::new();
        let mut direct: HashMap<GameKey, Vec<usize>> = HashMap::new();
        let mut swapped: HashMap<GameKey, Vec<usize>> = HashMap::new();
        for (idx, game) in persisted.iter().enumerate() {
            if let Some(id) = game.game_id {
                by_game_id.entry(id).or_insert(idx);
            }
            direct.entry(game.key()).or_default().push(idx);
            swapped.entry(game.key().swapped()).or_default().push(idx);
        }
        Self {
            by_game_id,
            direct,
            swapped,
        }
    }

    fn candidates(&self, key: GameKey) -> Vec<(usize, Orientation)> {
        let mut out = Vec::new();
        for idx in self.direct.get(&key).into_iter().flatten() {
            out.push((*idx, Orientation::Direct));
        }
        for idx in self.swapped.get(&key).into_iter().flatten() {
            if !out.iter().any(|(seen, _)| seen == idx) {
                out.push((*idx, Orientation::Swapped));
            }
        }
        out
    }
}

enum Claim {
    Persisted(usize),
    /// Index into `to_insert`, and how that record sits relative to the key.
    Batch(usize, Orientation),
}

fn orient(game: &GameRecord, orientation: Orientation) -> GameRecord {
    match orientation {
        Orientation::Direct => game.clone(),
        Orientation::Swapped => game.swapped(),
    }
}

/// Classifies each scraped game as insert, update or skip against the
/// persisted snapshot. Matching ignores home/away orientation. Once a
/// logical game has been claimed by a scraped record carrying an outcome,
/// later records for the same game can only agree (skip) or disagree
/// (conflict). Records without an outcome never claim anything.
pub fn reconcile(scraped: &[GameRecord], persisted: &[GameRecord]) -> Reconciliation {
    let batch = dedup_by_game_id(scraped);
    let index = SnapshotIndex::build(persisted);
    let mut out = Reconciliation::default();

    // Outcome that claimed a persisted row, in that row's orientation.
    let mut claimed: HashMap<usize, GameRecord> = HashMap::new();
    // Records inserted by this pass, keyed both ways.
    let mut inserted: HashMap<GameKey, (usize, Orientation)> = HashMap::new();

    for game in batch {
        if let Some(id) = game.game_id
            && index.by_game_id.contains_key(&id)
        {
            log::debug!("game {id} already persisted");
            out.skipped.push(game);
            continue;
        }

        let key = game.key();
        let candidates = index.candidates(key);
        let claim = match candidates.as_slice() {
            [] => match inserted.get(&key) {
                Some(&(slot, orientation)) => Claim::Batch(slot, orientation),
                None => {
                    let slot = out.to_insert.len();
                    inserted.insert(key, (slot, Orientation::Direct));
                    inserted.insert(key.swapped(), (slot, Orientation::Swapped));
                    out.to_insert.push(game);
                    continue;
                }
            },
            [(idx, _)] => Claim::Persisted(*idx),
            many => {
                push_conflict(
                    &mut out,
                    game,
                    many.iter().map(|(idx, _)| persisted[*idx].clone()).collect(),
                    format!("{} persisted games match in either orientation", many.len()),
                );
                continue;
            }
        };

        // Nothing scraped yet; never erase or contest what is already known.
        if !game.carries_outcome() {
            out.skipped.push(game);
            continue;
        }

        match claim {
            Claim::Batch(slot, orientation) => {
                let prior = orient(&out.to_insert[slot], orientation);
                if !prior.carries_outcome() {
                    // Played view replaces an earlier schedule-only view.
                    let replaced = std::mem::replace(&mut out.to_insert[slot], orient(&game, orientation));
                    out.skipped.push(replaced);
                } else if agrees(&prior, &game) {
                    out.skipped.push(game);
                } else {
                    push_conflict(
                        &mut out,
                        game,
                        vec![prior],
                        "disagrees with another scraped record for the same game".to_string(),
                    );
                }
            }
            Claim::Persisted(idx) => {
                let existing = &persisted[idx];
                let oriented = orient(&game, candidates[0].1);
                if let Some(prior) = claimed.get(&idx) {
                    if agrees(prior, &oriented) {
                        out.skipped.push(game);
                    } else {
                        push_conflict(
                            &mut out,
                            game,
                            vec![existing.clone()],
                            "two scraped records claim the same placeholder".to_string(),
                        );
                    }
                    continue;
                }
                claimed.insert(idx, oriented.clone());

                if !existing.is_placeholder() {
                    out.skipped.push(game);
                    continue;
                }
                let merged = write_outcome(existing, &oriented);
                if merged.same_outcome(existing) {
                    out.skipped.push(game);
                } else {
                    out.to_update.push(merged);
                }
            }
        }
    }

    log::info!(
        "reconciled {} scraped games: {} insert, {} update, {} skip, {} conflict",
        scraped.len(),
        out.to_insert.len(),
        out.to_update.len(),
        out.skipped.len(),
        out.conflicts.len()
    );
    out
}

// Two scraped views of one game; a missing game id is not a disagreement.
fn agrees(a: &GameRecord, b: &GameRecord) -> bool {
    let ids_agree = match (a.game_id, b.game_id) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    };
    ids_agree
        && a.home_score == b.home_score
        && a.away_score == b.away_score
        && a.home_won == b.home_won
        && a.overtime_periods == b.overtime_periods
}

fn write_outcome(placeholder: &GameRecord, oriented: &GameRecord) -> GameRecord {
    GameRecord {
        game_id: oriented.game_id,
        home_score: oriented.home_score,
        away_score: oriented.away_score,
        home_won: oriented.home_won,
        overtime_periods: oriented.overtime_periods,
        neutral_site: oriented.neutral_site,
        neutral_site_name: oriented.neutral_site_name.clone(),
        ..placeholder.clone()
    }
}

fn push_conflict(out: &mut Reconciliation, scraped: GameRecord, candidates: Vec<GameRecord>, reason: String) {
    let conflict = Conflict {
        scraped,
        candidates,
        reason,
    };
    log::warn!("{}", conflict.to_error());
    out.conflicts.push(conflict);
}

/// The snapshot as it looks after the gateway wrote `rec`.
pub fn apply(persisted: &[GameRecord], rec: &Reconciliation) -> Vec<GameRecord> {
    let mut out = persisted.to_vec();
    for update in &rec.to_update {
        if let Some(slot) = out
            .iter_mut()
            .find(|p| p.is_placeholder() && p.key() == update.key())
        {
            *slot = update.clone();
        }
    }
    out.extend(rec.to_insert.iter().cloned());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2014, 1, 5).unwrap()
    }

    fn game(game_id: Option<u64>, home: u64, away: u64, score: Option<(i64, i64)>) -> GameRecord {
        GameRecord {
            game_id,
            date: date(),
            home_team_id: Some(home),
            away_team_id: Some(away),
            opponent_label: "Opp".into(),
            neutral_site: false,
            neutral_site_name: None,
            home_won: score.map(|(h, a)| h > a),
            overtime_periods: 0,
            home_score: score.map(|(h, _)| h),
            away_score: score.map(|(_, a)| a),
        }
    }

    #[test]
    fn dedup_keeps_first_per_game_id() {
        let batch = vec![
            game(Some(1), 101, 102, Some((70, 65))),
            game(Some(1), 102, 101, Some((65, 70))),
            game(None, 103, 104, None),
            game(None, 103, 104, None),
        ];
        let out = dedup_by_game_id(&batch);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].home_team_id, Some(101));
    }

    #[test]
    fn swapped_placeholder_is_updated_in_its_orientation() {
        let scraped = vec![game(None, 101, 102, Some((70, 65)))];
        let persisted = vec![game(None, 102, 101, None)];
        let rec = reconcile(&scraped, &persisted);
        assert!(rec.to_insert.is_empty());
        assert_eq!(rec.to_update.len(), 1);
        let updated = &rec.to_update[0];
        assert_eq!(updated.home_team_id, Some(102));
        assert_eq!(updated.home_score, Some(65));
        assert_eq!(updated.away_score, Some(70));
        assert_eq!(updated.home_won, Some(false));
    }

    #[test]
    fn unmatched_game_is_inserted_once() {
        let scraped = vec![
            game(None, 101, 102, Some((70, 65))),
            game(None, 102, 101, Some((65, 70))),
        ];
        let rec = reconcile(&scraped, &[]);
        assert_eq!(rec.to_insert.len(), 1);
        assert_eq!(rec.skipped.len(), 1);
    }

    #[test]
    fn in_batch_disagreement_is_a_conflict() {
        let scraped = vec![
            game(None, 101, 102, Some((70, 65))),
            game(None, 102, 101, Some((70, 65))),
        ];
        let rec = reconcile(&scraped, &[]);
        assert_eq!(rec.to_insert.len(), 1);
        assert_eq!(rec.conflicts.len(), 1);
    }

    #[test]
    fn complete_game_is_skipped() {
        let scraped = vec![game(Some(9), 101, 102, Some((70, 65)))];
        let persisted = vec![game(Some(9), 102, 101, Some((65, 70)))];
        let rec = reconcile(&scraped, &persisted);
        assert!(rec.is_noop());
        assert_eq!(rec.skipped.len(), 1);
    }

    #[test]
    fn matches_in_both_orientations_conflict() {
        let scraped = vec![game(Some(5), 101, 102, Some((70, 65)))];
        let persisted = vec![game(None, 101, 102, None), game(None, 102, 101, None)];
        let rec = reconcile(&scraped, &persisted);
        assert!(rec.is_noop());
        assert_eq!(rec.conflicts.len(), 1);
        assert_eq!(rec.conflicts[0].candidates.len(), 2);
        assert!(matches!(
            rec.conflicts[0].to_error(),
            ScrapeError::ReconciliationConflict { .. }
        ));
    }

    #[test]
    fn unplayed_scrape_never_erases_placeholder() {
        let scraped = vec![game(None, 101, 102, None)];
        let persisted = vec![game(None, 101, 102, Some((1, 0)))];
        let rec = reconcile(&scraped, &persisted);
        assert!(rec.is_noop());
    }

    #[test]
    fn schedule_only_view_does_not_block_played_view() {
        let persisted = vec![game(None, 102, 101, None)];
        let scraped = vec![
            game(None, 101, 102, None),
            game(Some(3), 102, 101, Some((65, 70))),
        ];
        let rec = reconcile(&scraped, &persisted);
        assert!(rec.conflicts.is_empty());
        assert_eq!(rec.to_update.len(), 1);
        assert_eq!(rec.to_update[0].game_id, Some(3));
        assert_eq!(rec.skipped.len(), 1);
    }

    #[test]
    fn played_view_replaces_earlier_unplayed_insert() {
        let scraped = vec![
            game(None, 101, 102, None),
            game(Some(3), 102, 101, Some((65, 70))),
        ];
        let rec = reconcile(&scraped, &[]);
        assert!(rec.conflicts.is_empty());
        assert_eq!(rec.to_insert.len(), 1);
        let stored = &rec.to_insert[0];
        assert_eq!(stored.home_team_id, Some(101));
        assert_eq!(stored.game_id, Some(3));
        assert_eq!((stored.home_score, stored.away_score), (Some(70), Some(65)));
        assert_eq!(rec.skipped[0].game_id, None);
    }

    #[test]
    fn unplayed_view_after_played_insert_is_skipped() {
        let scraped = vec![
            game(Some(3), 102, 101, Some((65, 70))),
            game(None, 101, 102, None),
        ];
        let rec = reconcile(&scraped, &[]);
        assert!(rec.conflicts.is_empty());
        assert_eq!(rec.to_insert.len(), 1);
        assert_eq!(rec.to_insert[0].game_id, Some(3));
        assert_eq!(rec.skipped.len(), 1);
    }
}
