use std::sync::OnceLock;

use regex::Regex;

/// Characters stripped from numeric box-score cells.
pub const NOISE_CHARS: &[char] = &['*', '-', '/', '\u{c2}'];

fn outcome_re() -> &'static Regex {
    static OUTCOME_RE: OnceLock<Regex> = OnceLock::new();
    OUTCOME_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*([WLT])\s+(\d+)\s*-\s*(\d+)\s*(?:\(\s*(\d*)\s*OT\s*\))?")
            .expect("valid outcome regex")
    })
}

fn rank_prefix_re() -> &'static Regex {
    static RANK_RE: OnceLock<Regex> = OnceLock::new();
    RANK_RE.get_or_init(|| Regex::new(r"^#\d+\s+").expect("valid rank regex"))
}

/// Collapses whitespace, folds non-breaking spaces and drops stray `\u{c2}` bytes.
pub fn clean_text(raw: &str) -> String {
    let folded = raw.replace("&nbsp;", " ").replace("&amp;", "&");
    let mut out = String::with_capacity(folded.len());
    let mut prev_space = false;
    for ch in folded.chars() {
        if ch == '\u{c2}' {
            continue;
        }
        if ch.is_whitespace() || ch == '\u{a0}' {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

pub fn strip_noise(raw: &str) -> String {
    clean_text(raw)
        .chars()
        .filter(|ch| !NOISE_CHARS.contains(ch))
        .collect()
}

/// Minutes cell is `MM:00`; anything without the `:00` suffix counts as zero.
pub fn parse_minutes(raw: &str) -> i64 {
    let cleaned = clean_text(raw).replace('*', "");
    if !cleaned.contains(":00") {
        return 0;
    }
    cleaned.replace(":00", "").trim().parse::<i64>().unwrap_or(0)
}

/// `"Last, First"` to `(first, last)`. Bare tokens such as `Totals` land in `first`.
pub fn parse_name(raw: &str) -> (String, String) {
    let cleaned = clean_text(raw);
    match cleaned.split_once(',') {
        Some((last, first)) => (first.trim().to_string(), last.trim().to_string()),
        None => (cleaned, String::new()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Home,
    Away,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opponent {
    pub name: String,
    pub location: Location,
    pub neutral_site: Option<String>,
}

/// `"@ Duke"` is away, `"Duke @ Brooklyn, NY"` is neutral, `"Duke"` is home.
pub fn parse_opponent(raw: &str) -> Opponent {
    let cleaned = clean_text(raw);
    if let Some(rest) = cleaned.strip_prefix('@') {
        return Opponent {
            name: strip_rank(rest.trim()),
            location: Location::Away,
            neutral_site: None,
        };
    }
    if let Some((name, site)) = cleaned.split_once(" @ ") {
        return Opponent {
            name: strip_rank(name.trim()),
            location: Location::Neutral,
            neutral_site: Some(site.trim().to_string()).filter(|s| !s.is_empty()),
        };
    }
    Opponent {
        name: strip_rank(&cleaned),
        location: Location::Home,
        neutral_site: None,
    }
}

fn strip_rank(name: &str) -> String {
    rank_prefix_re().replace(name, "").trim().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub won: bool,
    pub team_score: i64,
    pub opp_score: i64,
    pub overtime_periods: u32,
}

/// `"W 70 - 65 (2OT)"`. Unplayed or cancelled games yield `None`.
pub fn parse_outcome(raw: &str) -> Option<Outcome> {
    let cleaned = clean_text(raw);
    let caps = outcome_re().captures(&cleaned)?;
    let won = caps.get(1)?.as_str().eq_ignore_ascii_case("W");
    let team_score = caps.get(2)?.as_str().parse::<i64>().ok()?;
    let opp_score = caps.get(3)?.as_str().parse::<i64>().ok()?;
    let overtime_periods = match caps.get(4) {
        Some(m) if !m.as_str().is_empty() => m.as_str().parse::<u32>().ok()?,
        Some(_) => 1,
        None => 0,
    };
    Some(Outcome {
        won,
        team_score,
        opp_score,
        overtime_periods,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayText {
    pub description: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// `"SMITH,JOHN made Layup"` to description plus name parts.
pub fn split_play(raw: &str) -> PlayText {
    let cleaned = clean_text(raw);
    if let Some((last, rest)) = cleaned.split_once(',') {
        let rest = rest.trim_start();
        let (first, description) = rest.split_once(' ').unwrap_or((rest, ""));
        if (!last.trim().is_empty() && !last.contains(' ')) || is_name_like(last) {
            return PlayText {
                description: description.trim().to_string(),
                first_name: Some(first.trim().to_string()),
                last_name: Some(last.trim().to_string()),
            };
        }
    }
    let description = cleaned
        .strip_prefix("TEAM ")
        .or_else(|| cleaned.strip_prefix("Team "))
        .unwrap_or(&cleaned)
        .trim()
        .to_string();
    PlayText {
        description,
        first_name: None,
        last_name: None,
    }
}

// Multi-word surnames ("VAN DYKE") are upper-case on play-by-play pages.
fn is_name_like(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_uppercase() || c == ' ' || c == '\'' || c == '.' || c == '-')
}

/// `MM:SS` or `MM:SS:cc` game clock to decimal minutes.
pub fn clock_to_minutes(raw: &str) -> Option<f64> {
    let cleaned = clean_text(raw);
    let mut parts = cleaned.split(':');
    let minutes = parts.next()?.trim().parse::<f64>().ok()?;
    let seconds = match parts.next() {
        Some(s) => s.trim().parse::<f64>().ok()?,
        None => 0.0,
    };
    let hundredths = match parts.next() {
        Some(s) => s.trim().parse::<f64>().ok()?,
        None => 0.0,
    };
    if parts.next().is_some() || seconds >= 60.0 {
        return None;
    }
    Some(minutes + (seconds + hundredths / 100.0) / 60.0)
}
