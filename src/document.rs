use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScrapeError};
use crate::text::clean_text;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
    pub text: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub cells: Vec<RawCell>,
    /// Every cell was a `<th>`.
    pub header: bool,
}

impl RawRow {
    pub fn cell(&self, idx: usize) -> Option<&RawCell> {
        self.cells.get(idx)
    }

    pub fn text(&self, idx: usize) -> &str {
        self.cells.get(idx).map(|c| c.text.as_str()).unwrap_or("")
    }

    pub fn link(&self, idx: usize) -> Option<&str> {
        self.cell(idx)?.href.as_deref()
    }
}

/// Owned snapshot of one `<table>`, independent of the DOM it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCount {
    Exactly(usize),
    AtLeast(usize),
}

impl TableCount {
    pub fn accepts(self, found: usize) -> bool {
        match self {
            TableCount::Exactly(n) => found == n,
            TableCount::AtLeast(n) => found >= n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    BoxScore,
    PlayByPlay,
    Schedule,
}

impl PageKind {
    pub fn expected_tables(self) -> TableCount {
        match self {
            PageKind::BoxScore => TableCount::Exactly(3),
            PageKind::PlayByPlay => TableCount::AtLeast(2),
            PageKind::Schedule => TableCount::Exactly(1),
        }
    }
}

/// Returns the tables carrying `marker` as a class, in document order.
/// A count that does not fit the page kind means the layout changed.
pub fn locate_tables(doc: &Html, marker: &str, page: PageKind) -> Result<Vec<RawTable>> {
    let table_sel = parse_selector(&format!("table.{marker}"))?;
    let tables = doc
        .select(&table_sel)
        .map(read_table)
        .collect::<Result<Vec<_>>>()?;

    let expected = page.expected_tables();
    if !expected.accepts(tables.len()) {
        return Err(ScrapeError::parse(format!(
            "{page:?} page: expected {expected:?} tables with class {marker:?}, found {}",
            tables.len()
        )));
    }
    log::debug!("{page:?} page: located {} tables", tables.len());
    Ok(tables)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRef {
    pub team_id: Option<u64>,
    pub label: String,
}

/// The two teams named by a page's summary table: row 0 is the column
/// header, rows 1 and 2 are the teams. The team id comes from the link in
/// the name cell; a row without one has no team id.
pub fn team_header(table: &RawTable) -> Result<[TeamRef; 2]> {
    let team = |idx: usize| -> Result<TeamRef> {
        let row = table
            .rows
            .get(idx)
            .ok_or_else(|| ScrapeError::parse(format!("team header is missing row {idx}")))?;
        Ok(TeamRef {
            team_id: row.link(0).and_then(crate::urls::url_to_team_id),
            label: row.text(0).to_string(),
        })
    };
    Ok([team(1)?, team(2)?])
}

pub fn parse_document(source: &str) -> Html {
    Html::parse_document(source)
}

fn read_table(table: ElementRef<'_>) -> Result<RawTable> {
    let row_sel = parse_selector("tr")?;
    let cell_sel = parse_selector("th, td")?;
    let link_sel = parse_selector("a[href]")?;

    let rows = table
        .select(&row_sel)
        .map(|tr| {
            let mut header = true;
            let cells = tr
                .select(&cell_sel)
                .map(|cell| {
                    if cell.value().name() != "th" {
                        header = false;
                    }
                    RawCell {
                        text: clean_text(&cell.text().collect::<String>()),
                        href: cell
                            .select(&link_sel)
                            .next()
                            .and_then(|a| a.value().attr("href"))
                            .map(|s| s.to_string()),
                    }
                })
                .collect::<Vec<_>>();
            RawRow {
                header: header && !cells.is_empty(),
                cells,
            }
        })
        .collect();
    Ok(RawTable { rows })
}

fn parse_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|err| ScrapeError::parse(format!("bad selector {raw:?}: {err:?}")))
}
