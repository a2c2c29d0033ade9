use thiserror::Error;

/// Failure classes of the extraction, normalization and reconciliation pipeline.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Table count or row shape does not match the page schema.
    #[error("parse error: {0}")]
    Parse(String),
    /// A column label with no canonical mapping. The mapping table is stale.
    #[error("unrecognized column label {label:?} (known labels do not cover this page version)")]
    SchemaDrift { label: String },
    /// Structurally valid but implausible result; queued for retry, never persisted.
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("ambiguous match for game on {date}: {detail}")]
    ReconciliationConflict { date: String, detail: String },
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl ScrapeError {
    pub fn parse(msg: impl Into<String>) -> Self {
        ScrapeError::Parse(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// A single row that could not be decomposed; the row was dropped.
#[derive(Debug)]
pub struct RowError {
    pub row_index: usize,
    pub error: ScrapeError,
}

/// Row-level failures collected while the rest of a table parsed.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub rows_seen: usize,
    pub errors: Vec<RowError>,
}

impl ParseReport {
    pub fn push(&mut self, row_index: usize, error: ScrapeError) {
        log::warn!("dropping row {row_index}: {error}");
        self.errors.push(RowError { row_index, error });
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows seen, {} dropped",
            self.rows_seen,
            self.errors.len()
        )
    }
}
