use std::collections::HashMap;

use crate::records::{AnnotatedPlay, PlayKind, PlayRecord, SituationFlags};

#[derive(Debug, Clone, Copy, Default)]
struct Possession {
    team_id: Option<u64>,
    index: u32,
    second_chance: bool,
    after_timeout: bool,
    after_turnover: bool,
    started_at: f64,
}

/// Team that has the ball according to `play`, if the play says so.
fn implied_offense(play: &PlayRecord) -> Option<Option<u64>> {
    let kind = play.play;
    let offensive = kind.is_made_field_goal()
        || kind.is_missed_field_goal()
        || matches!(
            kind,
            PlayKind::FreeThrowMade
                | PlayKind::FreeThrowMissed
                | PlayKind::Turnover
                | PlayKind::OffensiveRebound
                | PlayKind::DefensiveRebound
                | PlayKind::Assist
        );
    offensive.then_some(play.team_id)
}

/// Derives possessions and situational flags from an ordered play sequence.
pub fn annotate(plays: &[PlayRecord]) -> Vec<AnnotatedPlay> {
    let mut out = plays
        .iter()
        .enumerate()
        .map(|(idx, play)| AnnotatedPlay {
            seq: u32::try_from(idx + 1).unwrap_or(u32::MAX),
            possession: 0,
            poss_time: 0.0,
            poss_time_full: 0.0,
            home_fouls: 0,
            away_fouls: 0,
            play: play.clone(),
            flags: SituationFlags::default(),
            assist_play: None,
            recipient: None,
        })
        .collect::<Vec<_>>();

    track_possessions(&mut out);
    fill_possession_lengths(&mut out);
    count_team_fouls(&mut out);
    for range in same_clock_runs(plays) {
        pair_same_clock(&mut out[range]);
    }
    out
}

// The clock only moves up when a new period starts.
fn starts_period(prev: Option<f64>, elapsed: f64) -> bool {
    prev.is_some_and(|p| elapsed > p)
}

fn track_possessions(plays: &mut [AnnotatedPlay]) {
    let mut current: Option<Possession> = None;
    let mut timeout_pending = false;
    let mut last_turnover_team: Option<Option<u64>> = None;
    let mut next_index = 0u32;
    let mut prev_clock: Option<f64> = None;

    for item in plays.iter_mut() {
        let kind = item.play.play;
        let clock = item.play.elapsed_time;
        let new_period = starts_period(prev_clock, clock);
        prev_clock = Some(clock);
        if new_period && let Some(pos) = current.as_mut() {
            pos.started_at = clock;
        }
        if kind == PlayKind::Timeout {
            timeout_pending = true;
        }

        if let Some(team) = implied_offense(&item.play) {
            match current.as_mut() {
                Some(pos) if pos.team_id == team => {
                    if timeout_pending {
                        pos.after_timeout = true;
                    }
                }
                _ => {
                    next_index += 1;
                    current = Some(Possession {
                        team_id: team,
                        index: next_index,
                        second_chance: false,
                        after_timeout: timeout_pending,
                        after_turnover: last_turnover_team.is_some_and(|t| t != team),
                        started_at: clock,
                    });
                    last_turnover_team = None;
                }
            }
            timeout_pending = false;
        }

        let Some(pos) = current.as_mut() else {
            continue;
        };
        // A rebound of our own miss keeps the ball for a second chance.
        if kind == PlayKind::OffensiveRebound {
            pos.second_chance = true;
        }
        if kind == PlayKind::Turnover {
            last_turnover_team = Some(item.play.team_id);
        }

        item.possession = pos.index;
        item.poss_time = (pos.started_at - clock).max(0.0);
        if kind.points() > 0 && item.play.team_id == pos.team_id {
            item.flags.second_chance = pos.second_chance;
            item.flags.timeout_points = pos.after_timeout;
            item.flags.turnover_points = pos.after_turnover;
        }
    }
}

fn fill_possession_lengths(plays: &mut [AnnotatedPlay]) {
    let mut longest: HashMap<u32, f64> = HashMap::new();
    for item in plays.iter().filter(|p| p.possession > 0) {
        let slot = longest.entry(item.possession).or_insert(0.0);
        *slot = slot.max(item.poss_time);
    }
    for item in plays.iter_mut() {
        item.poss_time_full = longest.get(&item.possession).copied().unwrap_or(0.0);
    }
}

/// The team whose made shot first moves the home score.
fn home_team(plays: &[AnnotatedPlay]) -> Option<Option<u64>> {
    let mut prev_home = 0;
    for item in plays {
        let home = item.play.home_score;
        if item.play.play.points() > 0 && home > prev_home {
            return Some(item.play.team_id);
        }
        prev_home = home;
    }
    None
}

// Team fouls reset at halftime only; overtime carries the second-half count.
fn count_team_fouls(plays: &mut [AnnotatedPlay]) {
    let Some(home) = home_team(plays) else {
        log::debug!("no home score movement; team fouls left at zero");
        return;
    };
    let (mut home_fouls, mut away_fouls) = (0u32, 0u32);
    let mut prev_clock: Option<f64> = None;
    let mut past_halftime = false;

    for item in plays.iter_mut() {
        let clock = item.play.elapsed_time;
        if starts_period(prev_clock, clock) && !past_halftime {
            past_halftime = true;
            home_fouls = 0;
            away_fouls = 0;
        }
        prev_clock = Some(clock);

        if item.play.play == PlayKind::Foul {
            if item.play.team_id == home {
                home_fouls += 1;
            } else {
                away_fouls += 1;
            }
        }
        item.home_fouls = home_fouls;
        item.away_fouls = away_fouls;
    }
}

fn player_name(play: &PlayRecord) -> Option<String> {
    let last = play.last_name.as_deref()?;
    Some(match play.first_name.as_deref() {
        Some(first) => format!("{first} {last}"),
        None => last.to_string(),
    })
}

fn same_clock_runs(plays: &[PlayRecord]) -> Vec<std::ops::Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for idx in 1..=plays.len() {
        let boundary = idx == plays.len() || plays[idx].elapsed_time != plays[start].elapsed_time;
        if boundary {
            runs.push(start..idx);
            start = idx;
        }
    }
    runs
}

// Within one clock tick: assists, blocks, steals, and-ones and charges.
fn pair_same_clock(run: &mut [AnnotatedPlay]) {
    let mut used = vec![false; run.len()];

    for i in 0..run.len() {
        let kind = run[i].play.play;
        let team = run[i].play.team_id;

        if kind.is_made_field_goal() {
            if let Some(j) = find_unused(run, &used, |p| p.play == PlayKind::Assist && p.team_id == team) {
                used[j] = true;
                run[i].flags.assisted = true;
                run[j].assist_play = Some(kind);
                run[j].recipient = player_name(&run[i].play);
            }
            let shooter = run[i].play.clone();
            if run[i + 1..]
                .iter()
                .any(|p| p.play.play == PlayKind::FreeThrowMade && p.play.same_player(&shooter))
            {
                run[i].flags.and_one = true;
            }
        } else if kind.is_missed_field_goal() {
            if let Some(j) = find_unused(run, &used, |p| p.play == PlayKind::Block && p.team_id != team) {
                used[j] = true;
                run[i].flags.blocked = true;
            }
        } else if kind == PlayKind::Turnover {
            if let Some(j) = find_unused(run, &used, |p| p.play == PlayKind::Steal && p.team_id != team) {
                used[j] = true;
                run[i].flags.stolen = true;
            }
            let player = run[i].play.clone();
            if let Some(j) = run
                .iter()
                .position(|p| p.play.play == PlayKind::Foul && p.play.same_player(&player))
            {
                run[i].flags.charge = true;
                run[j].flags.charge = true;
            }
        }
    }
}

fn find_unused(
    run: &[AnnotatedPlay],
    used: &[bool],
    pred: impl Fn(&PlayRecord) -> bool,
) -> Option<usize> {
    run.iter()
        .enumerate()
        .find(|(j, p)| !used[*j] && pred(&p.play))
        .map(|(j, _)| j)
}
