//! Daily price series for a single symbol.
//!
//! A [`PriceSeries`] holds adjusted closes keyed by exchange-local trading date.
//! Non-trading days are absent rather than null-filled; a `NaN` value marks an
//! observation the provider returned without a price.

use crate::error::{MetricsError, Result};
use chrono::NaiveDate;
use polars::prelude::{DataFrame, DataType};
use serde::{Deserialize, Serialize};

/// `num_days_from_ce` of 1970-01-01, the origin of polars `Date` values.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A single dated observation. `NaN` marks a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Adjusted close
    pub value: f64,
}

impl PricePoint {
    /// Create a new observation.
    pub const fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }

    /// Whether the observation carries a value.
    pub const fn is_observed(&self) -> bool {
        !self.value.is_nan()
    }
}

/// Ordered adjusted-close series with strictly increasing dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create a series from points that are already in strictly increasing date order.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::UnorderedDates`] if two consecutive points do not
    /// advance in date.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        let symbol = symbol.into();
        if let Some(pair) = points.windows(2).find(|pair| pair[0].date >= pair[1].date) {
            return Err(MetricsError::UnorderedDates {
                symbol,
                previous: pair[0].date,
                next: pair[1].date,
            });
        }
        Ok(Self { symbol, points })
    }

    /// Create a series from `(date, value)` pairs in strictly increasing date order.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::UnorderedDates`] if the dates do not advance.
    pub fn from_pairs(
        symbol: impl Into<String>,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self> {
        let points = pairs
            .into_iter()
            .map(|(date, value)| PricePoint::new(date, value))
            .collect();
        Self::new(symbol, points)
    }

    /// Create a series from points in any order.
    ///
    /// Points are sorted by date; when a date repeats, the last point for that
    /// date wins.
    pub fn from_unsorted(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self {
            symbol: symbol.into(),
            points: deduped,
        }
    }

    /// An empty series for `symbol`.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    /// Build a series from a quote frame.
    ///
    /// The frame must carry a `date` column of polars `Date` type and the
    /// requested value column. When a `symbol` column is present only rows for
    /// `symbol` are kept; null values become missing observations.
    pub fn from_frame(df: &DataFrame, symbol: &str, value_column: &str) -> Result<Self> {
        let dates = df
            .column("date")
            .map_err(|_| MetricsError::MissingColumn("date".to_string()))?
            .cast(&DataType::Int32)?;
        let dates = dates.i32()?;
        let values = df
            .column(value_column)
            .map_err(|_| MetricsError::MissingColumn(value_column.to_string()))?
            .cast(&DataType::Float64)?;
        let values = values.f64()?;
        let symbol_column = df
            .column("symbol")
            .ok()
            .map(|c| c.cast(&DataType::String))
            .transpose()?;
        let symbols = symbol_column.as_ref().map(|c| c.str()).transpose()?;

        let mut points = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            if let Some(symbols) = symbols {
                if symbols.get(i) != Some(symbol) {
                    continue;
                }
            }
            let Some(days) = dates.get(i) else {
                continue;
            };
            let date = NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
                .ok_or(MetricsError::InvalidDate(days))?;
            points.push(PricePoint::new(date, values.get(i).unwrap_or(f64::NAN)));
        }

        Ok(Self::from_unsorted(symbol, points))
    }

    /// Symbol this series belongs to.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// All points, including missing observations.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of points, including missing observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points with a value, in date order.
    pub fn observed(&self) -> Vec<PricePoint> {
        self.points
            .iter()
            .copied()
            .filter(PricePoint::is_observed)
            .collect()
    }

    /// Values of the observed points, in date order.
    pub fn observed_values(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter(|p| p.is_observed())
            .map(|p| p.value)
            .collect()
    }

    /// Most recent point with a value.
    pub fn last_observed(&self) -> Option<PricePoint> {
        self.points.iter().rev().copied().find(PricePoint::is_observed)
    }

    /// Points dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> Self {
        Self {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .copied()
                .filter(|p| p.date >= start)
                .collect(),
        }
    }

    /// Copy of the series with each missing value replaced by the previous value.
    ///
    /// Missing values before the first observation stay missing.
    pub fn forward_filled(&self) -> Self {
        let mut carried = f64::NAN;
        let points = self
            .points
            .iter()
            .map(|p| {
                if p.is_observed() {
                    carried = p.value;
                }
                PricePoint::new(p.date, carried)
            })
            .collect();
        Self {
            symbol: self.symbol.clone(),
            points,
        }
    }
}
