//! Yahoo Finance data providers.

pub mod fundamentals;
pub mod quotes;
pub mod search;

pub use fundamentals::{YahooFundamentalsProvider, parse_quote_summary, parse_timeseries};
pub use quotes::{DEFAULT_CONCURRENCY, PriceRange, YahooQuoteProvider};
pub use search::{SearchHit, parse_search, search_tsx_symbols};
