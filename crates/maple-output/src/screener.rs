//! TSX screener: trailing returns for a filtered set of constituents.

use crate::format::{NOT_AVAILABLE, format_price, percent_points, truncate};
use chrono::NaiveDate;
use maple_data::UniverseRow;
use maple_metrics::{PriceMatrix, PriceSeries, ReturnProfile};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Default number of constituents priced by the screener.
pub const DEFAULT_MAX_TICKERS: usize = 120;

/// Bounds accepted for the number of priced constituents.
pub const MAX_TICKERS_RANGE: (usize, usize) = (20, 200);

/// Default number of rows displayed.
pub const DEFAULT_VISIBLE_ROWS: usize = 50;

/// Number of sectors selected when none are requested.
pub const DEFAULT_SECTOR_COUNT: usize = 6;

/// A symbol to screen with its listing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenerEntry {
    /// Yahoo Finance symbol
    pub symbol: String,
    /// Company name
    pub name: Option<String>,
    /// Listed sector
    pub sector: Option<String>,
}

impl ScreenerEntry {
    /// Create an entry.
    pub fn new(symbol: impl Into<String>, name: Option<String>, sector: Option<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name,
            sector,
        }
    }
}

impl From<&UniverseRow> for ScreenerEntry {
    fn from(row: &UniverseRow) -> Self {
        Self::new(row.symbol.clone(), row.name.clone(), row.sector.clone())
    }
}

/// One screener line. Returns are percentage points rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerRow {
    /// Symbol
    #[serde(rename = "Ticker")]
    pub ticker: String,
    /// Company name
    #[serde(rename = "Name")]
    pub name: Option<String>,
    /// Listed sector
    #[serde(rename = "Sector")]
    pub sector: Option<String>,
    /// 1-day return (%)
    #[serde(rename = "1D %")]
    pub one_day: Option<f64>,
    /// 1-week return (%)
    #[serde(rename = "1W %")]
    pub one_week: Option<f64>,
    /// 1-month return (%)
    #[serde(rename = "1M %")]
    pub one_month: Option<f64>,
    /// 3-month return (%)
    #[serde(rename = "3M %")]
    pub three_months: Option<f64>,
    /// 6-month return (%)
    #[serde(rename = "6M %")]
    pub six_months: Option<f64>,
    /// 1-year return (%)
    #[serde(rename = "1Y %")]
    pub one_year: Option<f64>,
    /// Year-to-date return (%)
    #[serde(rename = "YTD %")]
    pub ytd: Option<f64>,
    /// Last observed price
    #[serde(rename = "Last Price")]
    pub last_price: Option<f64>,
}

impl ScreenerRow {
    /// Build a row from a price series that is already aligned and forward filled.
    pub fn from_series(entry: &ScreenerEntry, series: &PriceSeries, as_of: NaiveDate) -> Self {
        let returns = ReturnProfile::compute(series, as_of);
        let pct = |value: Option<f64>| value.map(percent_points);
        Self {
            ticker: entry.symbol.clone(),
            name: entry.name.clone(),
            sector: entry.sector.clone(),
            one_day: pct(returns.one_day),
            one_week: pct(returns.one_week),
            one_month: pct(returns.one_month),
            three_months: pct(returns.three_months),
            six_months: pct(returns.six_months),
            one_year: pct(returns.one_year),
            ytd: pct(returns.ytd),
            last_price: series.last_observed().map(|p| p.value),
        }
    }

    /// Value of a numeric column; `None` for [`SortColumn::Ticker`].
    pub const fn value(&self, column: SortColumn) -> Option<f64> {
        match column {
            SortColumn::OneYear => self.one_year,
            SortColumn::Ytd => self.ytd,
            SortColumn::SixMonths => self.six_months,
            SortColumn::ThreeMonths => self.three_months,
            SortColumn::OneMonth => self.one_month,
            SortColumn::OneWeek => self.one_week,
            SortColumn::OneDay => self.one_day,
            SortColumn::Ticker => None,
        }
    }
}

/// Columns the screener can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortColumn {
    /// 1-year return
    #[default]
    OneYear,
    /// Year-to-date return
    Ytd,
    /// 6-month return
    SixMonths,
    /// 3-month return
    ThreeMonths,
    /// 1-month return
    OneMonth,
    /// 1-week return
    OneWeek,
    /// 1-day return
    OneDay,
    /// Symbol
    Ticker,
}

impl SortColumn {
    /// Every sort option, in menu order.
    pub const ALL: [Self; 8] = [
        Self::OneYear,
        Self::Ytd,
        Self::SixMonths,
        Self::ThreeMonths,
        Self::OneMonth,
        Self::OneWeek,
        Self::OneDay,
        Self::Ticker,
    ];

    /// Short label, also accepted by [`FromStr`].
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OneYear => "1Y",
            Self::Ytd => "YTD",
            Self::SixMonths => "6M",
            Self::ThreeMonths => "3M",
            Self::OneMonth => "1M",
            Self::OneWeek => "1W",
            Self::OneDay => "1D",
            Self::Ticker => "Ticker",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let options: Vec<_> = Self::ALL.iter().map(Self::label).collect();
                format!("unknown sort column '{s}' (expected one of {})", options.join(", "))
            })
    }
}

/// Order two rows; absent values always sort after present ones.
fn compare_rows(a: &ScreenerRow, b: &ScreenerRow, column: SortColumn, ascending: bool) -> Ordering {
    let directed = |ord: Ordering| if ascending { ord } else { ord.reverse() };
    if column == SortColumn::Ticker {
        return directed(a.ticker.cmp(&b.ticker));
    }
    match (a.value(column), b.value(column)) {
        (Some(x), Some(y)) => directed(x.total_cmp(&y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Screener result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenerTable {
    rows: Vec<ScreenerRow>,
}

impl ScreenerTable {
    /// Compute a row for every entry with prices.
    ///
    /// All series are aligned on the union of their dates and forward filled
    /// before returns are measured, so every window counts the same sessions.
    /// Entries without prices are skipped; repeated symbols keep the first entry.
    pub fn build(
        entries: &[ScreenerEntry],
        prices: &HashMap<String, PriceSeries>,
        as_of: NaiveDate,
    ) -> Self {
        let mut seen = HashSet::new();
        let priced: Vec<&ScreenerEntry> = entries
            .iter()
            .filter(|e| prices.get(&e.symbol).is_some_and(|s| !s.is_empty()))
            .filter(|e| seen.insert(e.symbol.as_str()))
            .collect();

        let series: Vec<PriceSeries> = priced
            .iter()
            .filter_map(|e| prices.get(&e.symbol).cloned())
            .collect();
        let matrix = PriceMatrix::align(&series).forward_filled();

        let rows = priced
            .into_iter()
            .filter_map(|entry| {
                matrix
                    .column(&entry.symbol)
                    .map(|column| ScreenerRow::from_series(entry, &column, as_of))
            })
            .collect();
        Self { rows }
    }

    /// Wrap precomputed rows.
    pub const fn from_rows(rows: Vec<ScreenerRow>) -> Self {
        Self { rows }
    }

    /// All rows in current order.
    pub fn rows(&self) -> &[ScreenerRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no entry had prices.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sort in place by `column`. The sort is stable.
    pub fn sort_by(&mut self, column: SortColumn, ascending: bool) {
        self.rows
            .sort_by(|a, b| compare_rows(a, b, column, ascending));
    }

    /// First `limit` rows.
    pub fn head(&self, limit: usize) -> &[ScreenerRow] {
        &self.rows[..limit.min(self.rows.len())]
    }

    /// Plain-text table of the first `limit` rows.
    pub fn to_ascii_table(&self, limit: usize) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{:<10} {:<28} {:<22} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10}\n",
            "Ticker", "Name", "Sector", "1D %", "1W %", "1M %", "3M %", "6M %", "1Y %", "YTD %",
            "Last"
        ));
        output.push_str(&"-".repeat(136));
        output.push('\n');
        for row in self.head(limit) {
            output.push_str(&format!(
                "{:<10} {:<28} {:<22} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10}\n",
                row.ticker,
                truncate(row.name.as_deref().unwrap_or(NOT_AVAILABLE), 28),
                truncate(row.sector.as_deref().unwrap_or(NOT_AVAILABLE), 22),
                cell(row.one_day),
                cell(row.one_week),
                cell(row.one_month),
                cell(row.three_months),
                cell(row.six_months),
                cell(row.one_year),
                cell(row.ytd),
                format_price(row.last_price, None),
            ));
        }
        if self.len() > limit {
            output.push_str(&format!("... {} more rows\n", self.len() - limit));
        }
        output
    }

    /// Markdown table of the first `limit` rows.
    pub fn to_markdown(&self, limit: usize) -> String {
        let mut output = String::new();
        output.push_str("| Ticker | Name | Sector | 1D % | 1W % | 1M % | 3M % | 6M % | 1Y % | YTD % | Last |\n");
        output.push_str("|--------|------|--------|-----:|-----:|-----:|-----:|-----:|-----:|------:|-----:|\n");
        for row in self.head(limit) {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                row.ticker,
                row.name.as_deref().unwrap_or(NOT_AVAILABLE),
                row.sector.as_deref().unwrap_or(NOT_AVAILABLE),
                cell(row.one_day),
                cell(row.one_week),
                cell(row.one_month),
                cell(row.three_months),
                cell(row.six_months),
                cell(row.one_year),
                cell(row.ytd),
                format_price(row.last_price, None),
            ));
        }
        output
    }
}

fn cell(points: Option<f64>) -> String {
    points.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}"))
}
