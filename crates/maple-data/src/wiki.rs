//! S&P/TSX Composite constituents from Wikipedia.
//!
//! The rendered page HTML is fetched through the MediaWiki parse API and the
//! first `wikitable` with a symbol or ticker column is read. Headers are matched by
//! substring in a fixed order, so "GICS Sub-Industry" becomes `industry` and
//! "Company name" becomes `name`. A failed fetch yields an empty universe.

use crate::error::{DataError, Result};
use crate::http::HttpClient;
use crate::symbols::TSX_SUFFIX;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

const API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Page listing the index constituents.
pub const TSX_COMPOSITE_PAGE: &str = "S&P/TSX_Composite_Index";

/// Default maximum number of constituents kept.
pub const DEFAULT_UNIVERSE_LIMIT: usize = 230;

/// One index constituent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseRow {
    /// Yahoo Finance symbol with `.TO` suffix
    pub symbol: String,
    /// Company name
    pub name: Option<String>,
    /// GICS sector name
    pub sector: Option<String>,
    /// Industry or sub-industry
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Symbol,
    Name,
    Sector,
    Industry,
}

fn classify_header(header: &str) -> Option<Column> {
    let header = header.to_lowercase();
    if header.contains("symbol") || header.contains("ticker") {
        Some(Column::Symbol)
    } else if header.contains("company") || header.contains("name") {
        Some(Column::Name)
    } else if header.contains("sector") {
        Some(Column::Sector)
    } else if header.contains("industry") || header.contains("sub") {
        Some(Column::Industry)
    } else {
        None
    }
}

/// A `wikitable`: header cells and data rows as plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct WikiTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| DataError::Parse(format!("Invalid selector {css}: {e}")))
}

/// Visible text of a cell; footnote markers and inline styles are skipped.
fn cell_text(cell: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in cell.descendants() {
        let Node::Text(t) = node.value() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|a| a.id() != cell.id())
            .filter_map(|a| a.value().as_element())
            .any(|e| matches!(e.name(), "sup" | "style"));
        if !hidden {
            text.push_str(t);
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read every `table.wikitable` of a rendered page.
///
/// The first row made only of `th` cells is the header; rows with at least
/// one `td` cell are data.
fn parse_tables(html: &str) -> Result<Vec<WikiTable>> {
    let document = Html::parse_document(html);
    let table_selector = selector("table.wikitable")?;
    let row_selector = selector("tr")?;

    let tables = document
        .select(&table_selector)
        .map(|table| {
            let mut parsed = WikiTable::default();
            for row in table.select(&row_selector) {
                let cells: Vec<ElementRef<'_>> = row
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| matches!(c.value().name(), "th" | "td"))
                    .collect();
                if cells.is_empty() {
                    continue;
                }
                let all_headers = cells.iter().all(|c| c.value().name() == "th");
                let texts: Vec<String> = cells.into_iter().map(cell_text).collect();
                if all_headers {
                    if parsed.header.is_empty() {
                        parsed.header = texts;
                    }
                } else {
                    parsed.rows.push(texts);
                }
            }
            parsed
        })
        .collect();
    Ok(tables)
}

/// Yahoo Finance form of a listed symbol: class shares use `-`, `.TO` appended.
///
/// Index symbols (`^` prefix) are returned unchanged.
pub fn listing_symbol(raw: &str) -> String {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() || symbol.starts_with('^') || symbol.ends_with(TSX_SUFFIX) {
        return symbol;
    }
    format!("{}{TSX_SUFFIX}", symbol.replace('.', "-"))
}

/// Extract constituents from the rendered page HTML.
///
/// Rows without a symbol and repeated symbols are dropped; at most `limit`
/// rows are kept when a limit is given.
pub fn parse_constituents(html: &str, limit: Option<usize>) -> Result<Vec<UniverseRow>> {
    let Some(table) = parse_tables(html)?.into_iter().find(|t| {
        t.header
            .iter()
            .any(|h| classify_header(h) == Some(Column::Symbol))
    }) else {
        return Ok(Vec::new());
    };

    let columns: Vec<Option<Column>> = table.header.iter().map(|h| classify_header(h)).collect();
    let position = |wanted: Column| columns.iter().position(|c| *c == Some(wanted));
    let Some(symbol_idx) = position(Column::Symbol) else {
        return Ok(Vec::new());
    };
    let name_idx = position(Column::Name);
    let sector_idx = position(Column::Sector);
    let industry_idx = position(Column::Industry);

    let cell = |row: &[String], idx: Option<usize>| {
        idx.and_then(|i| row.get(i))
            .filter(|v| !v.is_empty())
            .cloned()
    };

    let mut seen = HashSet::new();
    let rows = table
        .rows
        .iter()
        .filter_map(|row| {
            let symbol = listing_symbol(row.get(symbol_idx)?);
            if symbol.is_empty() || !seen.insert(symbol.clone()) {
                return None;
            }
            Some(UniverseRow {
                symbol,
                name: cell(row, name_idx),
                sector: cell(row, sector_idx),
                industry: cell(row, industry_idx),
            })
        })
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    Ok(rows)
}

/// Fetches index constituents from a Wikipedia page.
#[derive(Debug, Clone)]
pub struct WikiUniverseSource {
    http: HttpClient,
    page: String,
    limit: Option<usize>,
}

impl WikiUniverseSource {
    /// Source for the S&P/TSX Composite page with the default limit.
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            page: TSX_COMPOSITE_PAGE.to_string(),
            limit: Some(DEFAULT_UNIVERSE_LIMIT),
        }
    }

    /// Read a different page.
    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = page.into();
        self
    }

    /// Change the row limit; `None` keeps every row.
    pub const fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Fetch the rendered page HTML.
    pub async fn fetch_html(&self) -> Result<String> {
        let body: Value = self
            .http
            .get_json(
                API_URL,
                &[
                    ("action", "parse".to_string()),
                    ("page", self.page.clone()),
                    ("prop", "text".to_string()),
                    ("format", "json".to_string()),
                    ("formatversion", "2".to_string()),
                ],
            )
            .await?;

        body.pointer("/parse/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DataError::Parse(format!("No HTML for page {}", self.page)))
    }

    /// Fetch constituents, propagating failures.
    pub async fn try_fetch(&self) -> Result<Vec<UniverseRow>> {
        let html = self.fetch_html().await?;
        let rows = parse_constituents(&html, self.limit)?;
        debug!(page = %self.page, rows = rows.len(), "parsed constituents");
        Ok(rows)
    }

    /// Fetch constituents; any failure yields an empty list.
    pub async fn fetch(&self) -> Vec<UniverseRow> {
        match self.try_fetch().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(page = %self.page, error = %e, "failed to fetch universe");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PAGE: &str = r##"<div class="mw-parser-output">
<p>The <b>S&amp;P/TSX Composite Index</b> is the benchmark.<sup class="reference"><a href="#cite-1">[1]</a></sup></p>
<table class="wikitable">
<caption>Sector weights</caption>
<tbody>
<tr><th>Sector</th><th>Weight</th></tr>
<tr><td>Financials</td><td>31%</td></tr>
</tbody>
</table>
<h2>Constituents</h2>
<table class="wikitable sortable">
<tbody>
<tr><th>Ticker</th><th>Company</th><th><a href="/wiki/GICS">Sector</a></th><th>Sub-industry</th></tr>
<tr><td><a href="https://www.tmx.com/RY">RY</a></td><td><a href="/wiki/Royal_Bank_of_Canada">Royal Bank of Canada</a></td><td>Financials</td><td>Diversified Banks</td></tr>
<tr><td>BBD.B</td><td><a href="/wiki/Bombardier_Inc.">Bombardier</a></td><td>Industrials</td><td>Aerospace &amp; Defense<sup class="reference"><a href="#cite-b">[b]</a></sup></td></tr>
<tr><td style="text-align:left">ENB
</td><td><a href="/wiki/Enbridge">Enbridge</a>
</td><td>Energy
</td><td>Oil &amp; Gas   Storage
</td></tr>
<tr><td>RY</td><td>Royal Bank duplicate</td><td>Financials</td><td>Banks</td></tr>
<tr><td></td><td>Missing symbol</td><td>Energy</td><td></td></tr>
</tbody>
</table>
</div>"##;

    #[rstest]
    #[case("RY", "RY.TO")]
    #[case(" bbd.b ", "BBD-B.TO")]
    #[case("SHOP.TO", "SHOP.TO")]
    #[case("^GSPTSE", "^GSPTSE")]
    fn test_listing_symbol(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(listing_symbol(raw), expected);
    }

    #[test]
    fn test_parse_constituents() {
        let rows = parse_constituents(PAGE, None).unwrap();
        let symbols: Vec<_> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["RY.TO", "BBD-B.TO", "ENB.TO"]);

        assert_eq!(rows[0].name.as_deref(), Some("Royal Bank of Canada"));
        assert_eq!(rows[0].sector.as_deref(), Some("Financials"));
        assert_eq!(rows[0].industry.as_deref(), Some("Diversified Banks"));
        assert_eq!(rows[1].name.as_deref(), Some("Bombardier"));
        assert_eq!(rows[1].industry.as_deref(), Some("Aerospace & Defense"));
        assert_eq!(rows[2].name.as_deref(), Some("Enbridge"));
        assert_eq!(rows[2].industry.as_deref(), Some("Oil & Gas Storage"));
    }

    #[test]
    fn test_limit_applies_after_dedup() {
        let rows = parse_constituents(PAGE, Some(2)).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_no_symbol_table_is_empty() {
        let html = r#"<table class="wikitable"><tr><th>Sector</th><th>Weight</th></tr>
<tr><td>Energy</td><td>17%</td></tr></table>"#;
        assert!(parse_constituents(html, Some(10)).unwrap().is_empty());
    }

    #[test]
    fn test_only_wikitables_are_read() {
        let html = r#"<table class="infobox"><tr><th>Symbol</th></tr><tr><td>XYZ</td></tr></table>"#;
        assert!(parse_constituents(html, None).unwrap().is_empty());
    }

    #[test]
    fn test_cell_text_skips_footnotes() {
        let tables = parse_tables(PAGE).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].header, vec!["Ticker", "Company", "Sector", "Sub-industry"]);
        assert_eq!(tables[1].rows[1][3], "Aerospace & Defense");
        assert_eq!(tables[1].rows[2][3], "Oil & Gas Storage");
    }
}
