//! Index universes and sector classification.

pub mod gics;
pub mod tsx;

pub use gics::GicsSector;
pub use tsx::{Constituent, TsxUniverse};

/// A set of listed symbols.
pub trait Universe {
    /// All symbols, in index order.
    fn symbols(&self) -> Vec<String>;

    /// Whether `symbol` belongs to the universe.
    fn contains(&self, symbol: &str) -> bool {
        self.symbols().iter().any(|s| s == symbol)
    }

    /// Number of constituents.
    fn size(&self) -> usize {
        self.symbols().len()
    }
}

impl Universe for TsxUniverse {
    fn symbols(&self) -> Vec<String> {
        self.constituents()
            .iter()
            .map(|c| c.symbol.clone())
            .collect()
    }

    fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    fn size(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maple_data::UniverseRow;

    #[test]
    fn test_universe_trait() {
        let universe = TsxUniverse::from_rows(vec![UniverseRow {
            symbol: "CNR.TO".to_string(),
            name: Some("Canadian National Railway".to_string()),
            sector: Some("Industrials".to_string()),
            industry: None,
        }]);

        assert!(universe.contains("CNR.TO"));
        assert!(!universe.contains("CNR"));
        assert_eq!(universe.size(), 1);
        assert_eq!(Universe::symbols(&universe), vec!["CNR.TO"]);
    }
}
