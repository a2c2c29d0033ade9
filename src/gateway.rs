use std::path::Path;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use rusqlite::types::{ToSqlOutput, Type, Value as SqlValue, ValueRef};
use rusqlite::{Connection, Row, ToSql, params, params_from_iter};

use crate::error::{Result, ScrapeError};
use crate::records::{AnnotatedPlay, BoxStatRecord, GameRecord, PlayRecord};
use crate::sanitize::{SanitizedRows, ToRow, Value};

/// Persisted collections keyed by `game_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Games,
    BoxStats,
    PlayByPlay,
    RawPlayByPlay,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::Games => "games",
            Collection::BoxStats => "box_stats",
            Collection::PlayByPlay => "pbp",
            Collection::RawPlayByPlay => "raw_pbp",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Collection::Games => GameRecord::COLUMNS,
            Collection::BoxStats => BoxStatRecord::COLUMNS,
            Collection::PlayByPlay => AnnotatedPlay::COLUMNS,
            Collection::RawPlayByPlay => PlayRecord::COLUMNS,
        }
    }
}

/// Batched access to the relational store. Each write is atomic: either the
/// whole batch lands or none of it does, and failures always surface.
pub trait Gateway {
    fn load_games(&self) -> Result<Vec<GameRecord>>;
    fn insert_games(&mut self, rows: &SanitizedRows) -> Result<usize>;
    /// Fills placeholders matched on `(dt, hteam_id, ateam_id)`.
    fn update_games(&mut self, rows: &SanitizedRows) -> Result<usize>;
    fn delete_games(&mut self, game_ids: &[u64]) -> Result<usize>;
    fn insert_rows(&mut self, collection: Collection, rows: &SanitizedRows) -> Result<usize>;
    fn delete_rows_for_games(&mut self, collection: Collection, game_ids: &[u64]) -> Result<usize>;
    /// Deletes then inserts in a single transaction so a re-scrape never duplicates rows.
    fn replace_rows(&mut self, collection: Collection, game_id: u64, rows: &SanitizedRows) -> Result<usize>;
    /// `replace_rows` over several collections for one game, all in one transaction.
    /// Returns the inserted count per collection, in input order.
    fn replace_game_rows(&mut self, game_id: u64, batches: &[(Collection, &SanitizedRows)]) -> Result<Vec<usize>>;
    fn queue_retry(&mut self, game_id: u64, reason: &str) -> Result<()>;
    /// Games with an id but no rows in `collection`, minus those queued for retry; newest first.
    fn games_missing(&self, collection: Collection, limit: usize) -> Result<Vec<u64>>;
}

pub struct SqliteGateway {
    conn: Connection,
}

impl SqliteGateway {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn count_rows(&self, collection: Collection) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", collection.table());
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn execute_batch_rows(&mut self, sql: &str, rows: &SanitizedRows, width: usize) -> Result<usize> {
        check_width(rows, width)?;
        let tx = self.conn.transaction()?;
        let mut affected = 0usize;
        {
            let mut stmt = tx.prepare_cached(sql)?;
            for row in rows.rows() {
                affected += stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;
        Ok(affected)
    }

    fn delete_by_game_id(&mut self, table: &str, game_ids: &[u64]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut deleted = 0usize;
        {
            let mut stmt = tx.prepare_cached(&format!("DELETE FROM {table} WHERE game_id = ?1"))?;
            for id in game_ids {
                deleted += stmt.execute(params![sql_id(*id)?])?;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }
}

impl Gateway for SqliteGateway {
    fn load_games(&self) -> Result<Vec<GameRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT game_id, dt, hteam_id, ateam_id, opp_string, neutral,
                   neutral_site, home_outcome, numot, home_score, away_score
            FROM games
            ORDER BY dt, rowid
            "#,
        )?;
        let games = stmt
            .query_map([], game_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(games)
    }

    fn insert_games(&mut self, rows: &SanitizedRows) -> Result<usize> {
        self.insert_rows(Collection::Games, rows)
    }

    fn update_games(&mut self, rows: &SanitizedRows) -> Result<usize> {
        // Positional parameters follow the games column order.
        let sql = r#"
            UPDATE games
            SET game_id = ?1,
                opp_string = ?5,
                neutral = ?6,
                neutral_site = ?7,
                home_outcome = ?8,
                numot = ?9,
                home_score = ?10,
                away_score = ?11
            WHERE dt = ?2 AND hteam_id IS ?3 AND ateam_id IS ?4 AND game_id IS NULL
        "#;
        let updated = self.execute_batch_rows(sql, rows, GameRecord::COLUMNS.len())?;
        if updated != rows.len() {
            log::warn!("updated {updated} placeholder games for {} rows", rows.len());
        }
        Ok(updated)
    }

    fn delete_games(&mut self, game_ids: &[u64]) -> Result<usize> {
        self.delete_by_game_id(Collection::Games.table(), game_ids)
    }

    fn insert_rows(&mut self, collection: Collection, rows: &SanitizedRows) -> Result<usize> {
        let inserted =
            self.execute_batch_rows(&insert_sql(collection), rows, collection.columns().len())?;
        log::debug!("inserted {inserted} rows into {}", collection.table());
        Ok(inserted)
    }

    fn delete_rows_for_games(&mut self, collection: Collection, game_ids: &[u64]) -> Result<usize> {
        self.delete_by_game_id(collection.table(), game_ids)
    }

    fn replace_rows(&mut self, collection: Collection, game_id: u64, rows: &SanitizedRows) -> Result<usize> {
        let counts = self.replace_game_rows(game_id, &[(collection, rows)])?;
        Ok(counts.into_iter().next().unwrap_or(0))
    }

    fn replace_game_rows(&mut self, game_id: u64, batches: &[(Collection, &SanitizedRows)]) -> Result<Vec<usize>> {
        for (collection, rows) in batches {
            check_width(rows, collection.columns().len())?;
        }
        let id = sql_id(game_id)?;
        let tx = self.conn.transaction()?;
        let mut counts = Vec::with_capacity(batches.len());
        for (collection, rows) in batches {
            let table = collection.table();
            let removed = tx.execute(&format!("DELETE FROM {table} WHERE game_id = ?1"), params![id])?;
            let mut inserted = 0usize;
            {
                let mut stmt = tx.prepare_cached(&insert_sql(*collection))?;
                for row in rows.rows() {
                    inserted += stmt.execute(params_from_iter(row.iter()))?;
                }
            }
            if removed > 0 {
                log::info!("replacing {removed} {table} rows for game {game_id}");
            }
            counts.push(inserted);
        }
        tx.commit()?;
        Ok(counts)
    }

    fn queue_retry(&mut self, game_id: u64, reason: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO url_errors (game_id, reason, queued_at) VALUES (?1, ?2, ?3)",
            params![sql_id(game_id)?, reason, Utc::now().to_rfc3339()],
        )?;
        log::info!("queued game {game_id} for retry: {reason}");
        Ok(())
    }

    fn games_missing(&self, collection: Collection, limit: usize) -> Result<Vec<u64>> {
        let sql = format!(
            r#"
            SELECT game_id
            FROM games
            WHERE game_id IS NOT NULL
              AND game_id NOT IN (SELECT DISTINCT game_id FROM {table} WHERE game_id IS NOT NULL)
              AND game_id NOT IN (SELECT game_id FROM url_errors WHERE game_id IS NOT NULL)
            ORDER BY dt DESC
            LIMIT ?1
            "#,
            table = collection.table()
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![limit], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids.into_iter().filter_map(|id| u64::try_from(id).ok()).collect())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Int(n) => ToSqlOutput::Owned(SqlValue::Integer(*n)),
            Value::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

pub fn open_db(path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS games (
            game_id INTEGER NULL UNIQUE,
            dt TEXT NOT NULL,
            hteam_id INTEGER NULL,
            ateam_id INTEGER NULL,
            opp_string TEXT NOT NULL,
            neutral INTEGER NOT NULL,
            neutral_site TEXT NULL,
            home_outcome INTEGER NULL,
            numot INTEGER NOT NULL DEFAULT 0,
            home_score INTEGER NULL,
            away_score INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_games_key ON games(dt, hteam_id, ateam_id);

        CREATE TABLE IF NOT EXISTS box_stats (
            game_id INTEGER NULL,
            team TEXT NOT NULL,
            team_id INTEGER NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            pos TEXT NULL,
            min INTEGER NOT NULL,
            fgm INTEGER NULL,
            fga INTEGER NULL,
            tpm INTEGER NULL,
            tpa INTEGER NULL,
            ftm INTEGER NULL,
            fta INTEGER NULL,
            pts INTEGER NULL,
            oreb INTEGER NULL,
            dreb INTEGER NULL,
            reb INTEGER NULL,
            ast INTEGER NULL,
            turnover INTEGER NULL,
            stl INTEGER NULL,
            blk INTEGER NULL,
            pf INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_box_stats_game ON box_stats(game_id);

        CREATE TABLE IF NOT EXISTS raw_pbp (
            game_id INTEGER NULL,
            team_id INTEGER NULL,
            time REAL NOT NULL,
            first_name TEXT NULL,
            last_name TEXT NULL,
            play TEXT NOT NULL,
            hscore INTEGER NOT NULL,
            ascore INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_raw_pbp_game ON raw_pbp(game_id);

        CREATE TABLE IF NOT EXISTS pbp (
            game_id INTEGER NULL,
            pbp_id INTEGER NOT NULL,
            team_id INTEGER NULL,
            time REAL NOT NULL,
            first_name TEXT NULL,
            last_name TEXT NULL,
            play TEXT NOT NULL,
            hscore INTEGER NOT NULL,
            ascore INTEGER NOT NULL,
            possession INTEGER NOT NULL,
            poss_time_full REAL NOT NULL,
            poss_time REAL NOT NULL,
            home_fouls INTEGER NOT NULL,
            away_fouls INTEGER NOT NULL,
            second_chance INTEGER NOT NULL,
            timeout_pts INTEGER NOT NULL,
            turnover_pts INTEGER NOT NULL,
            and_one INTEGER NOT NULL,
            blocked INTEGER NOT NULL,
            stolen INTEGER NOT NULL,
            assisted INTEGER NOT NULL,
            assist_play TEXT NULL,
            recipient TEXT NULL,
            charge INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_pbp_game ON pbp(game_id);

        CREATE TABLE IF NOT EXISTS url_errors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            game_id INTEGER NULL,
            reason TEXT NOT NULL,
            queued_at TEXT NOT NULL
        );
        "#,
    )
    .context("init sqlite schema")?;
    Ok(())
}

fn insert_sql(collection: Collection) -> String {
    let columns = collection.columns();
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        collection.table(),
        columns.join(", ")
    )
}

fn check_width(rows: &SanitizedRows, width: usize) -> Result<()> {
    for (idx, row) in rows.rows().iter().enumerate() {
        if row.len() != width {
            return Err(ScrapeError::Validation(format!(
                "row {idx} has {} values, expected {width}",
                row.len()
            )));
        }
    }
    Ok(())
}

fn sql_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| ScrapeError::Validation(format!("game id {id} out of range")))
}

fn game_from_row(row: &Row<'_>) -> rusqlite::Result<GameRecord> {
    let dt: String = row.get(1)?;
    let date = NaiveDate::parse_from_str(&dt, "%Y-%m-%d")
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(err)))?;
    let id = |idx: usize| -> rusqlite::Result<Option<u64>> {
        Ok(row
            .get::<_, Option<i64>>(idx)?
            .and_then(|v| u64::try_from(v).ok()))
    };
    let numot: i64 = row.get(8)?;

    Ok(GameRecord {
        game_id: id(0)?,
        date,
        home_team_id: id(2)?,
        away_team_id: id(3)?,
        opponent_label: row.get(4)?,
        neutral_site: row.get::<_, i64>(5)? != 0,
        neutral_site_name: row.get(6)?,
        home_won: row.get::<_, Option<i64>>(7)?.map(|v| v != 0),
        overtime_periods: u32::try_from(numot).unwrap_or(0),
        home_score: row.get(9)?,
        away_score: row.get(10)?,
    })
}
