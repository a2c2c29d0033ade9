use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const CACHE_DIR: &str = "cbb_scrape";
const DB_FILE: &str = "cbb_stats.sqlite";

/// Heuristic gate for box-score pages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxValidityPolicy {
    pub required_totals_rows: usize,
    pub min_team_points: i64,
}

impl Default for BoxValidityPolicy {
    fn default() -> Self {
        Self {
            required_totals_rows: 2,
            min_team_points: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub table_marker: String,
    pub box_validity: BoxValidityPolicy,
    pub half_minutes: f64,
    pub overtime_minutes: f64,
    pub parse_parallelism: usize,
    pub db_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            table_marker: "mytable".to_string(),
            box_validity: BoxValidityPolicy::default(),
            half_minutes: 20.0,
            overtime_minutes: 5.0,
            parse_parallelism: 4,
            db_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let table_marker = opt_env("CBB_TABLE_MARKER").unwrap_or(defaults.table_marker);
        let required_totals_rows = parse_env("CBB_REQUIRED_TOTALS_ROWS")
            .unwrap_or(defaults.box_validity.required_totals_rows);
        let min_team_points =
            parse_env("CBB_MIN_TEAM_POINTS").unwrap_or(defaults.box_validity.min_team_points);
        let half_minutes = parse_env::<f64>("CBB_HALF_MINUTES")
            .filter(|m| *m > 0.0)
            .unwrap_or(defaults.half_minutes);
        let overtime_minutes = parse_env::<f64>("CBB_OVERTIME_MINUTES")
            .filter(|m| *m > 0.0)
            .unwrap_or(defaults.overtime_minutes);
        let parse_parallelism = parse_env::<usize>("CBB_PARSE_PARALLELISM")
            .unwrap_or(defaults.parse_parallelism)
            .clamp(1, 32);
        let db_path = opt_env("CBB_DB_PATH").map(PathBuf::from);

        Self {
            table_marker,
            box_validity: BoxValidityPolicy {
                required_totals_rows,
                min_team_points,
            },
            half_minutes,
            overtime_minutes,
            parse_parallelism,
            db_path,
        }
    }

    /// Length in minutes of period `index` (0 and 1 are halves, the rest overtimes).
    pub fn period_minutes(&self, index: usize) -> f64 {
        if index < 2 {
            self.half_minutes
        } else {
            self.overtime_minutes
        }
    }

    pub fn resolved_db_path(&self) -> Option<PathBuf> {
        self.db_path.clone().or_else(default_db_path)
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|val| if val.trim().is_empty() { None } else { Some(val) })
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    opt_env(key).and_then(|val| val.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_lengths_switch_to_overtime_after_two_halves() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.period_minutes(0), 20.0);
        assert_eq!(cfg.period_minutes(1), 20.0);
        assert_eq!(cfg.period_minutes(2), 5.0);
        assert_eq!(cfg.period_minutes(5), 5.0);
    }

    #[test]
    fn default_policy_matches_box_gate() {
        let policy = BoxValidityPolicy::default();
        assert_eq!(policy.required_totals_rows, 2);
        assert_eq!(policy.min_team_points, 5);
    }
}
