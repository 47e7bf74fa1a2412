//! Provider construction and progress-reported downloads.

use super::cache_manager;
use crate::config::Config;
use chrono::{Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use maple::TsxUniverse;
use maple_data::{CachedProvider, MarketDataProvider, PriceRange, YahooProvider};
use maple_metrics::PriceSeries;
use maple_output::{ExportError, ExportFormat, Exporter};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Provider used by every command.
pub(crate) type Provider = CachedProvider<YahooProvider>;

/// Error type for command pipelines.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    /// Provider or cache failure.
    #[error("Data error: {0}")]
    Data(#[from] maple_data::DataError),
    /// Export failure.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    /// Nothing usable came back.
    #[error("{0}")]
    NoData(String),
    /// Invalid user input.
    #[error("{0}")]
    Input(String),
}

/// Build the provider, falling back to no cache when it cannot be opened.
pub(crate) fn build_provider(config: &Config) -> Result<Provider, PipelineError> {
    let inner = YahooProvider::with_settings(config.rate_limit, config.concurrency)?;
    if !config.use_cache {
        return Ok(CachedProvider::uncached(inner));
    }
    let path = config.cache_path();
    match cache_manager::open_cache(&path) {
        Ok(cache) => {
            Ok(CachedProvider::new(inner, cache).with_force_refresh(config.force_refresh))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cache unavailable, continuing without it");
            Ok(CachedProvider::uncached(inner))
        }
    }
}

/// Calendar date used as "today" for year-to-date figures.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Spinner on stderr with `message`.
pub(crate) fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.into());
    pb
}

/// Download adjusted closes for `symbols` behind a spinner.
pub(crate) async fn fetch_prices<P: MarketDataProvider>(
    provider: &P,
    symbols: &[String],
    range: PriceRange,
) -> HashMap<String, PriceSeries> {
    let pb = spinner(format!(
        "Downloading {range} prices for {} symbols...",
        symbols.len()
    ));
    let prices = provider.get_prices(symbols, range).await;
    pb.finish_with_message(format!(
        "Loaded prices for {}/{} symbols",
        prices.len(),
        symbols.len()
    ));
    prices
}

/// Load the S&P/TSX Composite constituents.
pub(crate) async fn load_universe<P: MarketDataProvider>(
    provider: &P,
) -> Result<TsxUniverse, PipelineError> {
    let pb = spinner("Loading S&P/TSX Composite constituents...");
    let universe = TsxUniverse::from_rows(provider.universe().await);
    if universe.is_empty() {
        pb.finish_with_message("Failed!");
        return Err(PipelineError::NoData(
            "TSX universe unavailable right now".to_string(),
        ));
    }
    pb.finish_with_message(format!("{} constituents", universe.len()));
    Ok(universe)
}

/// Write `value` to `path`, choosing the format from the file extension.
pub(crate) fn export_to(value: &impl Exporter, path: &Path) -> Result<(), PipelineError> {
    let format = ExportFormat::from_path(path)?;
    value.export_to_file(path, format)?;
    info!(path = %path.display(), format = format.extension(), "exported");
    println!("Exported to {}", path.display());
    Ok(())
}
