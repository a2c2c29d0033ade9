use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::http_client::fetch_page;
use crate::pipeline::PageSource;

/// Loads `.env.local` then `.env`, and starts logging at `info` unless `RUST_LOG` says otherwise.
pub fn init_env() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// `--db=<path>` / `--db <path>`, then `CBB_DB_PATH`, then the cache dir.
pub fn resolve_db_path(args: &[String], config: &PipelineConfig) -> Result<PathBuf> {
    flag_value(args, "--db")
        .map(PathBuf::from)
        .or_else(|| config.resolved_db_path())
        .context("unable to resolve sqlite path")
}

pub fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

/// `--missing <n>`: how many unscraped games to pull from the store.
pub fn missing_limit(args: &[String]) -> Result<Option<usize>> {
    flag_value(args, "--missing")
        .map(|raw| {
            raw.parse::<usize>()
                .with_context(|| format!("--missing expects a count, got {raw:?}"))
        })
        .transpose()
}

/// Everything that is not a flag or a flag's value.
pub fn positional(args: &[String], flags_with_values: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if flags_with_values.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg.clone());
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageInput {
    /// Local HTML saved from `url`.
    File { url: String, path: PathBuf },
    Remote { url: String },
}

impl PageInput {
    pub fn parse(raw: &str) -> Self {
        // Query strings also carry '=', so only a trailing file-like part counts.
        if let Some((url, path)) = raw.rsplit_once('=')
            && !path.starts_with("http")
            && (path.contains('/') || path.contains('.'))
        {
            return PageInput::File {
                url: url.to_string(),
                path: PathBuf::from(path),
            };
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return PageInput::Remote {
                url: raw.to_string(),
            };
        }
        PageInput::File {
            url: raw.to_string(),
            path: PathBuf::from(raw),
        }
    }

    pub fn load(&self) -> Result<PageSource> {
        match self {
            PageInput::File { url, path } => {
                let html = std::fs::read_to_string(path)
                    .with_context(|| format!("read {}", path.display()))?;
                Ok(PageSource::new(url.clone(), html))
            }
            PageInput::Remote { url } => Ok(PageSource::new(url.clone(), fetch_page(url)?)),
        }
    }
}

/// Loads every input, keeping the ones that could be read.
pub fn load_pages(inputs: &[PageInput]) -> (Vec<PageSource>, Vec<String>) {
    let mut pages = Vec::new();
    let mut errors = Vec::new();
    for input in inputs {
        match input.load() {
            Ok(page) => pages.push(page),
            Err(err) => {
                log::warn!("skipping input: {err:#}");
                errors.push(format!("{err:#}"));
            }
        }
    }
    (pages, errors)
}
