//! Market overview: benchmark cards, macro gauges, breadth and movers.

use crate::format::{NOT_AVAILABLE, format_percent, format_thousands};
use chrono::NaiveDate;
use maple_metrics::{
    Breadth, IndexSnapshot, Mover, PriceSeries, advancers_decliners, index_snapshot, top_movers,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Benchmark indices shown on the overview.
pub const INDICES: [(&str, &str); 3] = [
    ("S&P/TSX Composite", "^GSPTSE"),
    ("S&P/TSX 60", "TX60.TS"),
    ("S&P 500", "^GSPC"),
];

/// Currency and commodity gauges shown on the overview.
pub const MACRO_INDICATORS: [(&str, &str); 4] = [
    ("CAD / USD", "CADUSD=X"),
    ("CAD / EUR", "CADEUR=X"),
    ("WTI crude", "CL=F"),
    ("Gold", "GC=F"),
];

/// Number of best and worst movers listed.
pub const DEFAULT_MOVERS: usize = 5;

/// One instrument with its headline figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentCard {
    /// Display name
    pub title: String,
    /// Provider symbol
    pub symbol: String,
    /// Figures; `None` when no price could be loaded
    pub snapshot: Option<IndexSnapshot>,
}

impl InstrumentCard {
    fn build(title: &str, symbol: &str, prices: &HashMap<String, PriceSeries>, as_of: NaiveDate) -> Self {
        let snapshot = prices
            .get(symbol)
            .map(|series| index_snapshot(series, as_of))
            .filter(|snapshot| snapshot.last.is_some());
        Self {
            title: title.to_string(),
            symbol: symbol.to_string(),
            snapshot,
        }
    }

    fn render(&self, last: impl Fn(f64) -> String) -> String {
        let label = format!("{} ({})", self.title, self.symbol);
        self.snapshot.as_ref().map_or_else(
            || format!("{label:<30} {:>14}\n", "unavailable"),
            |s| {
                format!(
                    "{label:<30} {:>14} {:>12} {:>12}\n",
                    s.last.map_or_else(|| NOT_AVAILABLE.to_string(), &last),
                    format_percent(s.one_day),
                    format_percent(s.ytd),
                )
            },
        )
    }
}

fn cards(
    list: &[(&str, &str)],
    prices: &HashMap<String, PriceSeries>,
    as_of: NaiveDate,
) -> Vec<InstrumentCard> {
    list.iter()
        .map(|(title, symbol)| InstrumentCard::build(title, symbol, prices, as_of))
        .collect()
}

/// Everything on the market overview screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    /// Session date the figures refer to
    pub as_of: NaiveDate,
    /// Benchmark indices
    pub indices: Vec<InstrumentCard>,
    /// Currency and commodity gauges
    pub macro_indicators: Vec<InstrumentCard>,
    /// Advancers and decliners among the constituents
    pub breadth: Breadth,
    /// Best then worst constituents on the day
    pub movers: Vec<Mover>,
}

impl MarketOverview {
    /// Build the overview from downloaded prices.
    ///
    /// `prices` holds every instrument and constituent by symbol; breadth and
    /// movers only consider `constituents`.
    pub fn build(
        prices: &HashMap<String, PriceSeries>,
        constituents: &[String],
        as_of: NaiveDate,
        movers: usize,
    ) -> Self {
        let members: Vec<PriceSeries> = constituents
            .iter()
            .filter_map(|symbol| prices.get(symbol).cloned())
            .collect();
        Self {
            as_of,
            indices: cards(&INDICES, prices, as_of),
            macro_indicators: cards(&MACRO_INDICATORS, prices, as_of),
            breadth: advancers_decliners(&members),
            movers: top_movers(&members, movers),
        }
    }

    /// Every symbol the overview needs besides the constituents.
    pub fn instrument_symbols() -> Vec<String> {
        INDICES
            .iter()
            .chain(MACRO_INDICATORS.iter())
            .map(|(_, symbol)| symbol.to_string())
            .collect()
    }

    /// Plain-text rendering.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("\nTSX market overview ({})\n", self.as_of));
        output.push_str(&"=".repeat(70));
        output.push('\n');

        output.push_str(&format!("{:<30} {:>14} {:>12} {:>12}\n", "Index", "Last", "1D", "YTD"));
        for card in &self.indices {
            output.push_str(&card.render(|v| format_thousands(Some(v))));
        }

        output.push_str(&format!("\n{:<30} {:>14} {:>12} {:>12}\n", "Macro", "Last", "1D", "YTD"));
        for card in &self.macro_indicators {
            output.push_str(&card.render(|v| format!("{v:.4}")));
        }

        output.push_str(&format!(
            "\nBreadth: {} advancing, {} declining\n",
            self.breadth.advancers, self.breadth.decliners
        ));
        if !self.movers.is_empty() {
            output.push_str("\nTop movers\n");
            for mover in &self.movers {
                output.push_str(&format!(
                    "{:<12} {:>12}\n",
                    mover.symbol,
                    format_percent(Some(mover.one_day))
                ));
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn series(symbol: &str, values: &[f64]) -> PriceSeries {
        let start = as_of() - Duration::days(values.len() as i64 - 1);
        PriceSeries::from_pairs(
            symbol,
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::days(i as i64), *v)),
        )
        .unwrap()
    }

    fn prices() -> HashMap<String, PriceSeries> {
        [
            series("^GSPTSE", &[21000.0, 21210.0]),
            series("CADUSD=X", &[0.74, 0.7363]),
            series("RY.TO", &[100.0, 102.0]),
            series("TD.TO", &[80.0, 78.0]),
            series("ENB.TO", &[50.0, 50.5]),
        ]
        .into_iter()
        .map(|s| (s.symbol().to_string(), s))
        .collect()
    }

    #[test]
    fn test_overview_cards_and_breadth() {
        let constituents: Vec<String> =
            ["RY.TO", "TD.TO", "ENB.TO", "GONE.TO"].iter().map(|s| s.to_string()).collect();
        let overview = MarketOverview::build(&prices(), &constituents, as_of(), 1);

        assert_eq!(overview.indices.len(), 3);
        assert!(overview.indices[0].snapshot.is_some());
        assert!(overview.indices[1].snapshot.is_none());
        assert_eq!(overview.breadth, Breadth { advancers: 2, decliners: 1 });
        let movers: Vec<_> = overview.movers.iter().map(|m| m.symbol.as_str()).collect();
        assert_eq!(movers, vec!["RY.TO", "TD.TO"]);

        let text = overview.to_ascii_table();
        assert!(text.contains("21,210"));
        assert!(text.contains("0.7363"));
        assert!(text.contains("S&P/TSX 60 (TX60.TS)"));
        assert!(text.contains("unavailable"));
        assert!(text.contains("2 advancing, 1 declining"));
    }

    #[test]
    fn test_instrument_symbols_cover_cards() {
        let symbols = MarketOverview::instrument_symbols();
        assert_eq!(symbols.len(), 7);
        assert!(symbols.contains(&"^GSPTSE".to_string()));
        assert!(symbols.contains(&"GC=F".to_string()));
    }
}
