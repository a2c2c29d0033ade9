use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::records::GameRecord;

const FIELD_COUNT: usize = 11;

/// Writes scraped games without a header, one row per game.
pub fn write_batch(path: &Path, games: &[GameRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("create batch {}", path.display()))?;
    for game in games {
        writer
            .write_record(game_fields(game))
            .context("write batch row")?;
    }
    writer.flush().context("flush batch")?;
    log::info!("wrote {} games to {}", games.len(), path.display());
    Ok(())
}

pub fn read_batch(path: &Path) -> Result<Vec<GameRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("open batch {}", path.display()))?;
    let mut games = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read batch row {idx}"))?;
        let game = game_from_record(&record).with_context(|| format!("batch row {idx}"))?;
        games.push(game);
    }
    Ok(games)
}

fn game_fields(game: &GameRecord) -> [String; FIELD_COUNT] {
    [
        opt_to_string(game.game_id),
        game.date.format("%Y-%m-%d").to_string(),
        opt_to_string(game.home_team_id),
        opt_to_string(game.away_team_id),
        game.opponent_label.clone(),
        game.outcome_code().unwrap_or("").to_string(),
        game.neutral_site_name.clone().unwrap_or_default(),
        game.neutral_site.to_string(),
        game.overtime_periods.to_string(),
        opt_to_string(game.home_score),
        opt_to_string(game.away_score),
    ]
}

fn game_from_record(record: &StringRecord) -> Result<GameRecord> {
    if record.len() != FIELD_COUNT {
        return Err(anyhow!(
            "expected {FIELD_COUNT} fields, found {}",
            record.len()
        ));
    }
    let field = |idx: usize| record.get(idx).unwrap_or("").trim();

    let date = NaiveDate::parse_from_str(field(1), "%Y-%m-%d")
        .with_context(|| format!("bad date {:?}", field(1)))?;
    // Older batches carry the outcome as a boolean.
    let home_won = match field(5).to_ascii_lowercase().as_str() {
        "w" | "true" => Some(true),
        "l" | "false" => Some(false),
        "" => None,
        _ => return Err(anyhow!("bad outcome {:?}", field(5))),
    };
    let neutral_site = match field(7).to_ascii_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" | "" => false,
        other => return Err(anyhow!("bad neutral flag {other:?}")),
    };
    let neutral_site_name = Some(field(6).to_string()).filter(|s| !s.is_empty());

    Ok(GameRecord {
        game_id: parse_opt(field(0))?,
        date,
        home_team_id: parse_opt(field(2))?,
        away_team_id: parse_opt(field(3))?,
        opponent_label: field(4).to_string(),
        neutral_site,
        neutral_site_name,
        home_won,
        overtime_periods: parse_opt(field(8))?.unwrap_or(0),
        home_score: parse_opt(field(9))?,
        away_score: parse_opt(field(10))?,
    })
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_opt<T: std::str::FromStr>(raw: &str) -> Result<Option<T>> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| anyhow!("bad numeric field {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<GameRecord> {
        vec![
            GameRecord {
                game_id: Some(3_512_345),
                date: NaiveDate::from_ymd_opt(2014, 1, 5).unwrap(),
                home_team_id: Some(101),
                away_team_id: Some(102),
                opponent_label: "Beta".into(),
                neutral_site: true,
                neutral_site_name: Some("Brooklyn, NY".into()),
                home_won: Some(true),
                overtime_periods: 2,
                home_score: Some(88),
                away_score: Some(85),
            },
            GameRecord {
                game_id: None,
                date: NaiveDate::from_ymd_opt(2014, 3, 1).unwrap(),
                home_team_id: Some(101),
                away_team_id: None,
                opponent_label: "Gamma".into(),
                neutral_site: false,
                neutral_site_name: None,
                home_won: None,
                overtime_periods: 0,
                home_score: None,
                away_score: None,
            },
        ]
    }

    #[test]
    fn batch_file_has_no_header_and_fixed_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");
        let games = sample();
        write_batch(&path, &games).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let first = raw.lines().next().unwrap();
        assert_eq!(
            first,
            "3512345,2014-01-05,101,102,Beta,W,\"Brooklyn, NY\",true,2,88,85"
        );
        assert_eq!(read_batch(&path).unwrap(), games);
    }

    #[test]
    fn boolean_outcomes_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        std::fs::write(
            &path,
            "1,2014-01-05,101,102,Beta,True,,False,0,70,65\n2,2014-01-06,101,103,Gamma,False,,False,0,60,61\n",
        )
        .unwrap();
        let games = read_batch(&path).unwrap();
        assert_eq!(games[0].home_won, Some(true));
        assert_eq!(games[1].home_won, Some(false));
        assert!(!games[1].neutral_site);

        std::fs::write(&path, "1,2014-01-05,101,102,Beta,Tie,,False,0,70,70\n").unwrap();
        assert!(read_batch(&path).is_err());
    }

    #[test]
    fn short_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "1,2014-01-05,101\n").unwrap();
        assert!(read_batch(&path).is_err());
    }
}
