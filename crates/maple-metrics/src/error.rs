//! Error types for building metric inputs.
//!
//! Metric functions themselves never fail: they return `None` when data is
//! insufficient. Errors only arise when constructing inputs that violate their
//! invariants.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for metric input construction.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Errors raised while constructing metric inputs.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Dates in a price series are not strictly increasing
    #[error("Dates for {symbol} are not strictly increasing: {previous} followed by {next}")]
    UnorderedDates {
        /// Symbol of the offending series
        symbol: String,
        /// Earlier observation date
        previous: NaiveDate,
        /// Date that failed to advance past `previous`
        next: NaiveDate,
    },

    /// A required column is missing from a frame
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A frame date could not be converted to a calendar date
    #[error("Invalid date value: {0}")]
    InvalidDate(i32),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
