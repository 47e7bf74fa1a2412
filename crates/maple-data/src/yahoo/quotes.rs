//! Daily quote fetching from Yahoo Finance.

use crate::error::{DataError, Result};
use chrono::{DateTime, Datelike, Duration as ChronoDuration, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use maple_metrics::PriceSeries;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

/// Default number of symbols fetched concurrently.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Lookback range for a price download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PriceRange {
    /// Last five sessions
    FiveDays,
    /// Last month
    OneMonth,
    /// Since January 1 of the current year
    YearToDate,
    /// Last year
    #[default]
    OneYear,
    /// Last two years
    TwoYears,
    /// Last three years
    ThreeYears,
    /// Last five years
    FiveYears,
    /// Last ten years
    TenYears,
    /// Full history
    Max,
}

impl PriceRange {
    /// All ranges, shortest first.
    pub const ALL: [Self; 9] = [
        Self::FiveDays,
        Self::OneMonth,
        Self::YearToDate,
        Self::OneYear,
        Self::TwoYears,
        Self::ThreeYears,
        Self::FiveYears,
        Self::TenYears,
        Self::Max,
    ];

    /// Short code, as accepted on the command line.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::YearToDate => "ytd",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::ThreeYears => "3y",
            Self::FiveYears => "5y",
            Self::TenYears => "10y",
            Self::Max => "max",
        }
    }

    /// First instant covered by the range when it ends at `end`.
    ///
    /// Calendar spans are padded so that trading-day windows of the same
    /// length are fully covered.
    pub fn start(&self, end: DateTime<Utc>) -> DateTime<Utc> {
        let days = |n: i64| end - ChronoDuration::days(n);
        match self {
            Self::FiveDays => days(10),
            Self::OneMonth => days(35),
            Self::YearToDate => Utc
                .with_ymd_and_hms(end.year(), 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_else(|| days(366)),
            Self::OneYear => days(370),
            Self::TwoYears => days(2 * 366),
            Self::ThreeYears => days(3 * 366),
            Self::FiveYears => days(5 * 366),
            Self::TenYears => days(10 * 366),
            Self::Max => DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PriceRange {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.code() == s)
            .ok_or_else(|| DataError::Parse(format!("Unknown price range: {s}")))
    }
}

/// Yahoo Finance quote provider with rate limiting.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a provider with the default request spacing (250 ms).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(250))
    }

    /// Create a provider that waits `rate_limit_delay` after each request.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    /// Fetch daily bars for a single symbol.
    ///
    /// Returns a DataFrame with columns: symbol, date, open, high, low, close,
    /// volume, adjusted_close. Dates are the session dates of the bars.
    pub async fn fetch_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame> {
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }
        if start > end {
            return Err(DataError::TimeConversion(format!(
                "start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }

        let start_time = time::OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await;
        sleep(self.rate_limit_delay).await;

        let quotes = response?
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No quotes returned".to_string(),
            });
        }
        debug!(symbol, bars = quotes.len(), "fetched quotes");

        let timestamps: Vec<i64> = quotes.iter().map(|q| q.timestamp).collect();
        let opens: Vec<f64> = quotes.iter().map(|q| q.open).collect();
        let highs: Vec<f64> = quotes.iter().map(|q| q.high).collect();
        let lows: Vec<f64> = quotes.iter().map(|q| q.low).collect();
        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        let volumes: Vec<u64> = quotes.iter().map(|q| q.volume).collect();
        let adj_closes: Vec<f64> = quotes.iter().map(|q| q.adjclose).collect();

        let mut df = DataFrame::new(vec![
            Series::new("timestamp".into(), timestamps).into(),
            Series::new("open".into(), opens).into(),
            Series::new("high".into(), highs).into(),
            Series::new("low".into(), lows).into(),
            Series::new("close".into(), closes).into(),
            Series::new("volume".into(), volumes).into(),
            Series::new("adjusted_close".into(), adj_closes).into(),
        ])?;

        let symbol_col: Column = Series::new("symbol".into(), vec![symbol; df.height()]).into();
        df.with_column(symbol_col)?;

        let df = df
            .lazy()
            .with_column(
                (col("timestamp") * lit(1_000_000_000))
                    .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                    .cast(DataType::Date)
                    .alias("date"),
            )
            .select(&[
                col("symbol"),
                col("date"),
                col("open"),
                col("high"),
                col("low"),
                col("close"),
                col("volume"),
                col("adjusted_close"),
            ])
            .collect()?;

        Ok(df)
    }

    /// Fetch the adjusted-close series for `symbol` over `range`, ending now.
    pub async fn fetch_price_series(&self, symbol: &str, range: PriceRange) -> Result<PriceSeries> {
        let end = Utc::now();
        let df = self.fetch_quotes(symbol, range.start(end), end).await?;
        Ok(PriceSeries::from_frame(&df, symbol, "adjusted_close")?)
    }

    /// Fetch adjusted-close series for many symbols with bounded concurrency.
    ///
    /// Symbols that fail are logged and left out of the result.
    pub async fn fetch_series_batch(
        &self,
        symbols: &[String],
        range: PriceRange,
        concurrency: usize,
    ) -> HashMap<String, PriceSeries> {
        stream::iter(symbols)
            .map(|symbol| async move {
                let result = self.fetch_price_series(symbol, range).await;
                (symbol, result)
            })
            .buffer_unordered(concurrency.max(1))
            .filter_map(|(symbol, result)| async move {
                match result {
                    Ok(series) if !series.is_empty() => Some((symbol.clone(), series)),
                    Ok(_) => None,
                    Err(e) => {
                        warn!(symbol = %symbol, error = %e, "failed to fetch prices");
                        None
                    }
                }
            })
            .collect()
            .await
    }

    /// Fetch daily bars for many symbols over `range` and stack them in one frame.
    pub async fn fetch_quotes_batch(
        &self,
        symbols: &[String],
        range: PriceRange,
    ) -> Result<DataFrame> {
        let end = Utc::now();
        let start = range.start(end);
        let mut frames = Vec::new();

        for symbol in symbols {
            match self.fetch_quotes(symbol, start, end).await {
                Ok(df) => frames.push(df.lazy()),
                Err(e) => warn!(symbol = %symbol, error = %e, "failed to fetch quotes"),
            }
        }

        if frames.is_empty() {
            return Err(DataError::MissingData {
                symbol: "batch".to_string(),
                reason: "No data fetched for any symbol".to_string(),
            });
        }

        Ok(concat(frames, UnionArgs::default())?.collect()?)
    }
}
