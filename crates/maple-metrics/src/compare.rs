//! Multi-symbol price alignment for side-by-side comparison.

use crate::series::{PricePoint, PriceSeries};
use chrono::NaiveDate;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How prices are rescaled relative to the first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// `p / p0 * 100`
    #[default]
    Base100,
    /// `(p / p0 - 1) * 100`
    CumulativePercent,
}

impl Normalization {
    fn apply(self, value: f64, base: f64) -> f64 {
        if base == 0.0 || base.is_nan() {
            return f64::NAN;
        }
        match self {
            Self::Base100 => value / base * 100.0,
            Self::CumulativePercent => (value / base - 1.0) * 100.0,
        }
    }
}

/// Prices of several symbols on a common date axis.
///
/// Rows are dates in increasing order and columns are symbols. Missing
/// observations are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    values: Array2<f64>,
}

impl PriceMatrix {
    /// Align series on the union of their dates.
    pub fn align(series: &[PriceSeries]) -> Self {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.points().iter().map(|p| p.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let symbols: Vec<String> = series.iter().map(|s| s.symbol().to_string()).collect();

        let mut values = Array2::from_elem((dates.len(), series.len()), f64::NAN);
        for (j, s) in series.iter().enumerate() {
            for point in s.points() {
                if let Ok(i) = dates.binary_search(&point.date) {
                    values[[i, j]] = point.value;
                }
            }
        }

        Self {
            dates,
            symbols,
            values,
        }
    }

    /// Row dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column symbols.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Raw values, dates by symbols.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the matrix has no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Carry the last observed value of each column forward.
    pub fn forward_filled(&self) -> Self {
        let mut values = self.values.clone();
        for mut column in values.columns_mut() {
            let mut carried = f64::NAN;
            for v in column.iter_mut() {
                if v.is_nan() {
                    *v = carried;
                } else {
                    carried = *v;
                }
            }
        }
        Self {
            dates: self.dates.clone(),
            symbols: self.symbols.clone(),
            values,
        }
    }

    /// Drop rows where every column is missing.
    pub fn drop_empty_rows(&self) -> Self {
        let keep: Vec<usize> = self
            .values
            .axis_iter(Axis(0))
            .enumerate()
            .filter(|(_, row)| row.iter().any(|v| !v.is_nan()))
            .map(|(i, _)| i)
            .collect();
        self.select_rows(&keep)
    }

    /// Keep rows dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> Self {
        let keep: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| **d >= start)
            .map(|(i, _)| i)
            .collect();
        self.select_rows(&keep)
    }

    fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            dates: rows.iter().map(|&i| self.dates[i]).collect(),
            symbols: self.symbols.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }

    /// Rescale every column relative to its value in the first row.
    ///
    /// A column whose first value is missing or zero becomes entirely missing.
    pub fn normalized(&self, method: Normalization) -> Self {
        let mut values = self.values.clone();
        if !self.is_empty() {
            for mut column in values.columns_mut() {
                let base = column[0];
                column.mapv_inplace(|v| method.apply(v, base));
            }
        }
        Self {
            dates: self.dates.clone(),
            symbols: self.symbols.clone(),
            values,
        }
    }

    /// Value of each symbol on the last row.
    pub fn last_row(&self) -> Vec<(String, Option<f64>)> {
        let last = self.values.nrows().checked_sub(1);
        self.symbols
            .iter()
            .enumerate()
            .map(|(j, symbol)| {
                let value = last
                    .map(|i| self.values[[i, j]])
                    .filter(|v| !v.is_nan());
                (symbol.clone(), value)
            })
            .collect()
    }

    /// Column for `symbol` as a series.
    pub fn column(&self, symbol: &str) -> Option<PriceSeries> {
        let j = self.symbols.iter().position(|s| s == symbol)?;
        let points = self
            .dates
            .iter()
            .zip(self.values.column(j))
            .map(|(date, value)| PricePoint::new(*date, *value))
            .collect();
        PriceSeries::new(symbol, points).ok()
    }
}
