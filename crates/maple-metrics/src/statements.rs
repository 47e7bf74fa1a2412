//! Financial statement tables and line-item aggregation.
//!
//! A [`StatementTable`] maps line-item labels to dated values. Row order is
//! significant: label resolution scans rows in order and the first match wins.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Number of quarters summed into a trailing-twelve-month figure.
pub const TTM_QUARTERS: usize = 4;

/// A value reported for one fiscal period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    /// Period end date
    pub period_end: NaiveDate,
    /// Reported value, if any
    pub value: Option<f64>,
}

impl PeriodValue {
    /// Create a new period value. Non-finite values are stored as missing.
    pub fn new(period_end: NaiveDate, value: Option<f64>) -> Self {
        Self {
            period_end,
            value: value.filter(|v| v.is_finite()),
        }
    }
}

/// One labelled row of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Human-readable label, e.g. "Net Income"
    pub label: String,
    /// Values ordered most recent first
    pub values: Vec<PeriodValue>,
}

impl LineItem {
    /// Create a row; values are reordered most recent first.
    pub fn new(label: impl Into<String>, mut values: Vec<PeriodValue>) -> Self {
        values.sort_by(|a, b| b.period_end.cmp(&a.period_end));
        Self {
            label: label.into(),
            values,
        }
    }

    /// Non-missing observations in ascending date order.
    pub fn observed_ascending(&self) -> Vec<(NaiveDate, f64)> {
        let mut observed: Vec<(NaiveDate, f64)> = self
            .values
            .iter()
            .filter_map(|pv| pv.value.map(|v| (pv.period_end, v)))
            .collect();
        observed.sort_by_key(|(date, _)| *date);
        observed
    }

    /// Value reported for `period_end`, if any.
    pub fn value_at(&self, period_end: NaiveDate) -> Option<f64> {
        self.values
            .iter()
            .find(|pv| pv.period_end == period_end)
            .and_then(|pv| pv.value)
    }
}

/// A statement at one granularity (quarterly or annual).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    rows: Vec<LineItem>,
}

impl StatementTable {
    /// Create a table with rows in scan order.
    pub const fn new(rows: Vec<LineItem>) -> Self {
        Self { rows }
    }

    /// Append a row at the end of the scan order.
    pub fn push(&mut self, row: LineItem) {
        self.rows.push(row);
    }

    /// Rows in scan order.
    pub fn rows(&self) -> &[LineItem] {
        &self.rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row with exactly this label.
    pub fn row(&self, label: &str) -> Option<&LineItem> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Distinct period end dates across all rows, most recent first.
    pub fn periods(&self) -> Vec<NaiveDate> {
        let periods: BTreeSet<NaiveDate> = self
            .rows
            .iter()
            .flat_map(|r| r.values.iter().map(|pv| pv.period_end))
            .collect();
        periods.into_iter().rev().collect()
    }

    /// Per-row preview sum over the four most recent periods of the table.
    ///
    /// Returns `None` when the table spans fewer than four periods. Unlike
    /// [`ttm_sum`], missing cells are skipped rather than making the value
    /// undefined; a row with no value in those periods sums to `None`.
    pub fn ttm_column(&self) -> Option<Vec<(String, Option<f64>)>> {
        let periods = self.periods();
        if periods.len() < TTM_QUARTERS {
            return None;
        }
        let recent = &periods[..TTM_QUARTERS];
        let column = self
            .rows
            .iter()
            .map(|row| {
                let sum = recent
                    .iter()
                    .filter_map(|period| row.value_at(*period))
                    .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0) + v));
                (row.label.clone(), sum)
            })
            .collect();
        Some(column)
    }
}

/// Six statement tables for one issuer, any of which may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statements {
    /// Quarterly income statement
    pub income_quarterly: StatementTable,
    /// Annual income statement
    pub income_annual: StatementTable,
    /// Quarterly balance sheet
    pub balance_sheet_quarterly: StatementTable,
    /// Annual balance sheet
    pub balance_sheet_annual: StatementTable,
    /// Quarterly cash flow statement
    pub cashflow_quarterly: StatementTable,
    /// Annual cash flow statement
    pub cashflow_annual: StatementTable,
}

impl Statements {
    /// Whether every table is empty.
    pub fn is_empty(&self) -> bool {
        self.tables().iter().all(|(_, t)| t.is_empty())
    }

    /// All tables with their display names.
    pub const fn tables(&self) -> [(&'static str, &StatementTable); 6] {
        [
            ("Income Statement (quarterly)", &self.income_quarterly),
            ("Income Statement (annual)", &self.income_annual),
            ("Balance Sheet (quarterly)", &self.balance_sheet_quarterly),
            ("Balance Sheet (annual)", &self.balance_sheet_annual),
            ("Cash Flow (quarterly)", &self.cashflow_quarterly),
            ("Cash Flow (annual)", &self.cashflow_annual),
        ]
    }
}

fn resolve_row<'a>(table: &'a StatementTable, candidates: &[&str]) -> Option<&'a LineItem> {
    for candidate in candidates {
        let needle = candidate.to_lowercase();
        if let Some(row) = table
            .rows
            .iter()
            .find(|row| row.label.to_lowercase().contains(&needle))
        {
            return Some(row);
        }
    }
    None
}

/// Resolve the first row whose label contains a candidate, case-insensitively.
///
/// Candidates are tried in order; for each, rows are scanned in table order.
pub fn resolve_line_item<'a>(table: &'a StatementTable, candidates: &[&str]) -> Option<&'a str> {
    resolve_row(table, candidates).map(|row| row.label.as_str())
}

/// Trailing-twelve-month sum of the resolved line item.
///
/// Sums the four most recent non-missing values. Returns `None` when the label
/// does not resolve or fewer than four values remain.
pub fn ttm_sum(table: &StatementTable, candidates: &[&str]) -> Option<f64> {
    let observed = resolve_row(table, candidates)?.observed_ascending();
    if observed.len() < TTM_QUARTERS {
        return None;
    }
    Some(
        observed[observed.len() - TTM_QUARTERS..]
            .iter()
            .map(|(_, v)| v)
            .sum(),
    )
}

/// Most recent non-missing value of the resolved line item.
pub fn latest_value(table: &StatementTable, candidates: &[&str]) -> Option<f64> {
    resolve_row(table, candidates)?
        .observed_ascending()
        .last()
        .map(|(_, v)| *v)
}
