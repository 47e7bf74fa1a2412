//! Ticker normalization for Toronto Stock Exchange listings.

use std::collections::HashSet;

/// Suffix Yahoo Finance uses for TSX listings.
pub const TSX_SUFFIX: &str = ".TO";

/// S&P/TSX Composite index symbol.
pub const TSX_COMPOSITE: &str = "^GSPTSE";

/// Normalize a user-supplied ticker to its Yahoo Finance TSX form.
///
/// Trims and uppercases the input, then appends `.TO` unless the symbol
/// already ends with it or is an index (`^` prefix). Returns an empty string
/// for blank input.
///
/// ```
/// use maple_data::normalize_ticker;
///
/// assert_eq!(normalize_ticker(" ry "), "RY.TO");
/// assert_eq!(normalize_ticker("shop.to"), "SHOP.TO");
/// assert_eq!(normalize_ticker("^gsptse"), "^GSPTSE");
/// ```
pub fn normalize_ticker(ticker: &str) -> String {
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() || ticker.starts_with('^') || ticker.ends_with(TSX_SUFFIX) {
        return ticker;
    }
    format!("{ticker}{TSX_SUFFIX}")
}

/// Normalize a batch of tickers, dropping blanks and duplicates while keeping
/// first-seen order.
pub fn dedup_symbols<S: AsRef<str>>(tickers: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .iter()
        .map(|t| normalize_ticker(t.as_ref()))
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Whether `symbol` is listed on the TSX in Yahoo Finance notation.
pub fn is_tsx_symbol(symbol: &str) -> bool {
    symbol.to_uppercase().ends_with(TSX_SUFFIX)
}
