//! Side-by-side cumulative performance of a few symbols.

use crate::format::NOT_AVAILABLE;
use chrono::NaiveDate;
use maple_metrics::{Normalization, PriceMatrix, PriceSeries};
use serde::{Deserialize, Serialize};

/// Maximum number of user-supplied symbols in one comparison.
pub const MAX_COMPARE_TICKERS: usize = 5;

/// Rescaled price paths on a shared date axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Rescaling applied to every column
    pub normalization: Normalization,
    /// First date kept, when the history was truncated
    pub start: Option<NaiveDate>,
    /// Column symbols in request order
    pub symbols: Vec<String>,
    /// Row dates, ascending
    pub dates: Vec<NaiveDate>,
    /// Row-major values; `None` before a symbol's first observation
    pub values: Vec<Vec<Option<f64>>>,
}

impl ComparisonReport {
    /// Align, forward fill and rescale `series`.
    ///
    /// Rows where every symbol is missing are dropped before truncating to
    /// `start`; the first remaining row is the rescaling base.
    pub fn build(
        series: &[PriceSeries],
        start: Option<NaiveDate>,
        normalization: Normalization,
    ) -> Self {
        let mut matrix = PriceMatrix::align(series).forward_filled().drop_empty_rows();
        if let Some(start) = start {
            matrix = matrix.since(start);
        }
        let matrix = matrix.normalized(normalization);

        let values = matrix
            .values()
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|v| Some(*v).filter(|v| !v.is_nan())).collect())
            .collect();
        Self {
            normalization,
            start,
            symbols: matrix.symbols().to_vec(),
            dates: matrix.dates().to_vec(),
            values,
        }
    }

    /// Whether no date survived alignment.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Final value per symbol, sorted by symbol.
    pub fn last_point(&self) -> Vec<(String, Option<f64>)> {
        let last = self.values.last();
        let mut points: Vec<(String, Option<f64>)> = self
            .symbols
            .iter()
            .enumerate()
            .map(|(j, symbol)| (symbol.clone(), last.and_then(|row| row[j])))
            .collect();
        points.sort_by(|a, b| a.0.cmp(&b.0));
        points
    }

    fn unit(&self) -> &'static str {
        match self.normalization {
            Normalization::Base100 => "",
            Normalization::CumulativePercent => " %",
        }
    }

    /// Last point per symbol plus every `step`-th row of the path.
    pub fn to_ascii_table(&self, step: usize) -> String {
        let mut output = String::new();
        let title = match self.normalization {
            Normalization::Base100 => "Normalized performance (base 100)",
            Normalization::CumulativePercent => "Cumulative return (%)",
        };
        output.push_str(&format!("\n{title}\n"));
        if let (Some(first), Some(last)) = (self.dates.first(), self.dates.last()) {
            output.push_str(&format!("{first} to {last}\n"));
        }
        output.push_str(&"-".repeat(40));
        output.push('\n');
        for (symbol, value) in self.last_point() {
            let value = value.map_or_else(
                || NOT_AVAILABLE.to_string(),
                |v| format!("{v:.2}{}", self.unit()),
            );
            output.push_str(&format!("{symbol:<12} {value:>16}\n"));
        }

        if step > 0 && !self.is_empty() {
            output.push_str(&format!("\n{:<12}", "Date"));
            for symbol in &self.symbols {
                output.push_str(&format!(" {symbol:>10}"));
            }
            output.push('\n');
            let last = self.dates.len() - 1;
            for (i, (date, row)) in self.dates.iter().zip(&self.values).enumerate() {
                if i % step != 0 && i != last {
                    continue;
                }
                output.push_str(&format!("{:<12}", date.to_string()));
                for value in row {
                    let cell = value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}"));
                    output.push_str(&format!(" {cell:>10}"));
                }
                output.push('\n');
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(symbol: &str, points: &[(u32, f64)]) -> PriceSeries {
        PriceSeries::from_pairs(symbol, points.iter().map(|(day, v)| (d(*day), *v))).unwrap()
    }

    #[test]
    fn test_base100_from_first_row() {
        let report = ComparisonReport::build(
            &[
                series("RY.TO", &[(2, 100.0), (3, 110.0), (4, 121.0)]),
                series("^GSPTSE", &[(2, 200.0), (4, 220.0)]),
            ],
            None,
            Normalization::Base100,
        );
        assert_eq!(report.dates.len(), 3);
        // Missing index bar on the 3rd is forward filled
        assert_relative_eq!(report.values[1][1].unwrap(), 100.0);

        let last = report.last_point();
        assert_eq!(last[0].0, "RY.TO");
        assert_relative_eq!(last[0].1.unwrap(), 121.0);
        assert_relative_eq!(last[1].1.unwrap(), 110.0);
    }

    #[test]
    fn test_start_truncates_before_rescaling() {
        let report = ComparisonReport::build(
            &[series("ENB.TO", &[(2, 50.0), (3, 40.0), (4, 44.0)])],
            Some(d(3)),
            Normalization::CumulativePercent,
        );
        assert_eq!(report.dates, vec![d(3), d(4)]);
        assert_relative_eq!(report.values[0][0].unwrap(), 0.0);
        assert_relative_eq!(report.values[1][0].unwrap(), 10.0, epsilon = 1e-9);
        assert!(report.to_ascii_table(1).contains("10.00 %"));
    }

    #[test]
    fn test_late_listing_stays_missing() {
        let report = ComparisonReport::build(
            &[
                series("RY.TO", &[(2, 100.0), (3, 101.0)]),
                series("NEW.TO", &[(3, 10.0)]),
            ],
            None,
            Normalization::Base100,
        );
        assert_eq!(report.values[0][1], None);
        assert_eq!(report.last_point()[0], ("NEW.TO".to_string(), None));
        assert!(report.to_ascii_table(0).contains("n/a"));
    }

    #[test]
    fn test_empty_input() {
        let report = ComparisonReport::build(&[], None, Normalization::Base100);
        assert!(report.is_empty());
        assert!(report.last_point().is_empty());
    }
}
