//! Symbol search restricted to Toronto listings.

use crate::error::Result;
use crate::http::HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";

/// A TSX listing matching a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Yahoo Finance symbol, e.g. `RY.TO`
    pub symbol: String,
    /// Display name, possibly empty
    pub name: String,
    /// Quote type, e.g. `EQUITY` or `ETF`
    pub kind: String,
}

fn is_tsx_quote(symbol: &str, exchange: &str) -> bool {
    symbol.ends_with(".TO") || matches!(exchange, "TSX" | "TOR")
}

/// Extract TSX hits from a search response body, keeping provider order.
pub fn parse_search(body: &Value) -> Vec<SearchHit> {
    let Some(quotes) = body.get("quotes").and_then(Value::as_array) else {
        return Vec::new();
    };
    let text = |quote: &Value, key: &str| {
        quote
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    quotes
        .iter()
        .filter_map(|quote| {
            let symbol = text(quote, "symbol")?;
            let exchange = text(quote, "exchange").unwrap_or_default();
            if !is_tsx_quote(&symbol, &exchange) {
                return None;
            }
            let name = text(quote, "shortname")
                .or_else(|| text(quote, "longname"))
                .or_else(|| text(quote, "name"))
                .unwrap_or_default();
            Some(SearchHit {
                symbol,
                name,
                kind: text(quote, "quoteType").unwrap_or_default(),
            })
        })
        .collect()
}

/// Search TSX symbols by ticker or company name.
///
/// A blank query returns no hits without issuing a request.
pub async fn search_tsx_symbols(
    http: &HttpClient,
    query: &str,
    max_results: usize,
) -> Result<Vec<SearchHit>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let body: Value = http
        .get_json(
            SEARCH_URL,
            &[
                ("q", query.to_string()),
                ("lang", "fr-CA".to_string()),
                ("region", "CA".to_string()),
                ("quotesCount", max_results.to_string()),
                ("newsCount", "0".to_string()),
            ],
        )
        .await?;
    Ok(parse_search(&body))
}
