#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/maple/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod http;
pub mod news;
pub mod provider;
pub mod symbols;
pub mod wiki;
pub mod yahoo;

pub use cache::{CacheOperation, CachePolicy, CacheStats, SqliteCache};
pub use error::{DataError, Result};
pub use http::HttpClient;
pub use news::{NewsFeed, NewsItem};
pub use provider::{CachedProvider, MarketDataProvider, YahooProvider};
pub use symbols::{dedup_symbols, normalize_ticker};
pub use wiki::{UniverseRow, WikiUniverseSource};
pub use yahoo::{PriceRange, SearchHit, YahooFundamentalsProvider, YahooQuoteProvider};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
