//! Time-series return engine.
//!
//! Returns are plain ratios (`last / base - 1`), not log returns, and are never
//! rounded here. Missing values are dropped before indexing; callers that want
//! gaps carried forward apply [`PriceSeries::forward_filled`] first.

use crate::ratios::safe_div;
use crate::series::PriceSeries;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed trading-day windows used across the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReturnWindow {
    /// 1 trading day
    OneDay,
    /// 5 trading days (~1 week)
    OneWeek,
    /// 21 trading days (~1 month)
    OneMonth,
    /// 63 trading days (~3 months)
    ThreeMonths,
    /// 126 trading days (~6 months)
    SixMonths,
    /// 252 trading days (~1 year)
    OneYear,
}

impl ReturnWindow {
    /// All windows, shortest first.
    pub const ALL: [Self; 6] = [
        Self::OneDay,
        Self::OneWeek,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
    ];

    /// Number of trading days spanned by the window.
    pub const fn trading_days(&self) -> usize {
        match self {
            Self::OneDay => 1,
            Self::OneWeek => 5,
            Self::OneMonth => 21,
            Self::ThreeMonths => 63,
            Self::SixMonths => 126,
            Self::OneYear => 252,
        }
    }

    /// Short display label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OneDay => "1D",
            Self::OneWeek => "1W",
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
        }
    }
}

impl fmt::Display for ReturnWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Return over the last `n_trading_days` observations.
///
/// Computes `last / value n_trading_days back - 1` over the observed values.
/// Returns `None` when the series has `n_trading_days` or fewer observed points,
/// or when the base value is zero.
pub fn windowed_return(series: &PriceSeries, n_trading_days: usize) -> Option<f64> {
    let values = series.observed_values();
    if values.len() <= n_trading_days {
        return None;
    }
    let last = values[values.len() - 1];
    let base = values[values.len() - 1 - n_trading_days];
    safe_div(Some(last), Some(base)).map(|ratio| ratio - 1.0)
}

/// Calendar year-to-date return as of `as_of`.
///
/// Keeps observations dated on or after January 1 of `as_of`'s year and
/// returns `last / first - 1`. Dates are exchange-local calendar dates.
/// Returns `None` when fewer than two observed points remain.
pub fn year_to_date_return(series: &PriceSeries, as_of: NaiveDate) -> Option<f64> {
    let start = NaiveDate::from_ymd_opt(as_of.year(), 1, 1)?;
    let values: Vec<f64> = series
        .points()
        .iter()
        .filter(|p| p.date >= start && p.is_observed())
        .map(|p| p.value)
        .collect();
    if values.len() < 2 {
        return None;
    }
    safe_div(values.last().copied(), values.first().copied()).map(|ratio| ratio - 1.0)
}

/// Returns over every [`ReturnWindow`] plus year-to-date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnProfile {
    /// 1-day return
    pub one_day: Option<f64>,
    /// 1-week return
    pub one_week: Option<f64>,
    /// 1-month return
    pub one_month: Option<f64>,
    /// 3-month return
    pub three_months: Option<f64>,
    /// 6-month return
    pub six_months: Option<f64>,
    /// 1-year return
    pub one_year: Option<f64>,
    /// Year-to-date return
    pub ytd: Option<f64>,
}

impl ReturnProfile {
    /// Compute every window for `series` as of `as_of`.
    pub fn compute(series: &PriceSeries, as_of: NaiveDate) -> Self {
        let window = |w: ReturnWindow| windowed_return(series, w.trading_days());
        Self {
            one_day: window(ReturnWindow::OneDay),
            one_week: window(ReturnWindow::OneWeek),
            one_month: window(ReturnWindow::OneMonth),
            three_months: window(ReturnWindow::ThreeMonths),
            six_months: window(ReturnWindow::SixMonths),
            one_year: window(ReturnWindow::OneYear),
            ytd: year_to_date_return(series, as_of),
        }
    }

    /// Return for a fixed window.
    pub const fn get(&self, window: ReturnWindow) -> Option<f64> {
        match window {
            ReturnWindow::OneDay => self.one_day,
            ReturnWindow::OneWeek => self.one_week,
            ReturnWindow::OneMonth => self.one_month,
            ReturnWindow::ThreeMonths => self.three_months,
            ReturnWindow::SixMonths => self.six_months,
            ReturnWindow::OneYear => self.one_year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;
    use rstest::rstest;

    fn daily(start: NaiveDate, values: &[f64]) -> PriceSeries {
        PriceSeries::from_pairs(
            "XIU.TO",
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::days(i as i64), *v)),
        )
        .unwrap()
    }

    fn five_day_series() -> PriceSeries {
        daily(
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            &[100.0, 102.0, 101.0, 105.0, 110.0],
        )
    }

    #[test]
    fn test_window_of_one_day() {
        let r = windowed_return(&five_day_series(), 1).unwrap();
        assert_relative_eq!(r, 110.0 / 105.0 - 1.0);
        assert_relative_eq!(r, 0.047_619, epsilon = 1e-6);
    }

    #[test]
    fn test_window_spanning_whole_series() {
        let r = windowed_return(&five_day_series(), 4).unwrap();
        assert_relative_eq!(r, 0.10, epsilon = 1e-12);
    }

    #[rstest]
    #[case(5)]
    #[case(6)]
    #[case(252)]
    fn test_window_needs_n_plus_one_points(#[case] n: usize) {
        assert_eq!(windowed_return(&five_day_series(), n), None);
    }

    #[rstest]
    #[case(1)]
    #[case(5)]
    #[case(21)]
    fn test_exactly_n_plus_one_points(#[case] n: usize) {
        let values: Vec<f64> = (0..=n).map(|i| 50.0 + i as f64 * 0.5).collect();
        let series = daily(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(), &values);
        let expected = values[n] / values[0] - 1.0;
        assert_eq!(windowed_return(&series, n), Some(expected));
    }

    #[test]
    fn test_missing_values_dropped_before_indexing() {
        let series = daily(
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            &[100.0, f64::NAN, 120.0, f64::NAN],
        );
        assert_relative_eq!(windowed_return(&series, 1).unwrap(), 0.2, epsilon = 1e-12);
        assert_eq!(windowed_return(&series, 2), None);
    }

    #[test]
    fn test_zero_base_is_undefined() {
        let series = daily(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), &[0.0, 5.0]);
        assert_eq!(windowed_return(&series, 1), None);
    }

    #[test]
    fn test_ytd_uses_first_point_of_year() {
        let series = PriceSeries::from_pairs(
            "XIU.TO",
            vec![
                (NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(), 30.0),
                (NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 32.0),
                (NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 33.0),
                (NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 36.0),
            ],
        )
        .unwrap();
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_relative_eq!(
            year_to_date_return(&series, as_of).unwrap(),
            36.0 / 32.0 - 1.0
        );
    }

    #[test]
    fn test_ytd_single_point_is_undefined() {
        let series = PriceSeries::from_pairs(
            "XIU.TO",
            vec![
                (NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(), 30.0),
                (NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 32.0),
            ],
        )
        .unwrap();
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(year_to_date_return(&series, as_of), None);
    }

    #[test]
    fn test_ytd_two_points() {
        let series = PriceSeries::from_pairs(
            "XIU.TO",
            vec![
                (NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 40.0),
                (NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), 42.0),
            ],
        )
        .unwrap();
        let as_of = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(year_to_date_return(&series, as_of), Some(42.0 / 40.0 - 1.0));
    }

    #[test]
    fn test_return_profile_partial_history() {
        let profile = ReturnProfile::compute(
            &five_day_series(),
            NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
        );
        assert!(profile.one_day.is_some());
        assert_eq!(profile.one_week, None);
        assert_eq!(profile.one_year, None);
        assert_relative_eq!(profile.ytd.unwrap(), 0.10, epsilon = 1e-12);
        assert_eq!(profile.get(ReturnWindow::OneDay), profile.one_day);
    }

    #[test]
    fn test_window_trading_days() {
        let days: Vec<usize> = ReturnWindow::ALL.iter().map(|w| w.trading_days()).collect();
        assert_eq!(days, vec![1, 5, 21, 63, 126, 252]);
    }
}
