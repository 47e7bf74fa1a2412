//! Turning a free-text stock query into a TSX symbol.

use maple_data::{SearchHit, normalize_ticker};

/// Outcome of resolving a stock query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// The query already looked like a ticker.
    Ticker(String),
    /// The best search hit, with the other candidates.
    Search {
        symbol: String,
        alternatives: Vec<SearchHit>,
    },
    /// Nothing matched.
    NotFound,
}

impl Resolution {
    /// Resolved symbol, if any.
    pub(crate) fn symbol(&self) -> Option<&str> {
        match self {
            Self::Ticker(symbol) | Self::Search { symbol, .. } => Some(symbol),
            Self::NotFound => None,
        }
    }
}

/// Whether `query` should be used as a ticker without searching.
///
/// True for index symbols, dotted symbols and short purely alphabetic input.
pub(crate) fn looks_like_ticker(query: &str) -> bool {
    let query = query.trim();
    query.starts_with('^')
        || (query.contains('.') && !query.contains(char::is_whitespace))
        || (!query.is_empty() && query.chars().count() <= 5 && query.chars().all(char::is_alphabetic))
}

/// Pick a symbol for `query` given the provider's TSX search hits.
///
/// Ticker-like queries skip the hits entirely. Otherwise the first hit wins.
/// A single-word query with no hits falls back to its normalized form.
pub(crate) fn resolve_query(query: &str, hits: &[SearchHit]) -> Resolution {
    let query = query.trim();
    if query.is_empty() {
        return Resolution::NotFound;
    }
    if looks_like_ticker(query) {
        return Resolution::Ticker(normalize_ticker(query));
    }
    match hits.split_first() {
        Some((best, rest)) => Resolution::Search {
            symbol: best.symbol.clone(),
            alternatives: rest.to_vec(),
        },
        None if !query.contains(char::is_whitespace) => Resolution::Ticker(normalize_ticker(query)),
        None => Resolution::NotFound,
    }
}
