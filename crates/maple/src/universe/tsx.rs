//! S&P/TSX Composite universe.

use crate::universe::gics::GicsSector;
use maple_data::UniverseRow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Index constituent with its reported and GICS sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constituent {
    /// Yahoo Finance symbol
    pub symbol: String,
    /// Company name
    pub name: Option<String>,
    /// Sector as listed
    pub sector: Option<String>,
    /// Industry as listed
    pub industry: Option<String>,
    /// GICS sector, when the listed sector maps to one
    pub gics: Option<GicsSector>,
}

impl From<UniverseRow> for Constituent {
    fn from(row: UniverseRow) -> Self {
        let gics = row.sector.as_deref().and_then(GicsSector::from_name);
        Self {
            symbol: row.symbol,
            name: row.name,
            sector: row.sector,
            industry: row.industry,
            gics,
        }
    }
}

impl Constituent {
    /// Case-insensitive substring match on symbol or name.
    ///
    /// The needle must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.symbol.to_lowercase().contains(needle)
            || self
                .name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(needle))
    }
}

/// Constituents of the S&P/TSX Composite in index order.
#[derive(Debug, Clone, Default)]
pub struct TsxUniverse {
    constituents: Vec<Constituent>,
    index: HashMap<String, usize>,
}

impl TsxUniverse {
    /// Build the universe from fetched rows; repeated symbols keep the first row.
    pub fn from_rows(rows: Vec<UniverseRow>) -> Self {
        let mut universe = Self::default();
        for row in rows {
            if universe.index.contains_key(&row.symbol) {
                continue;
            }
            universe
                .index
                .insert(row.symbol.clone(), universe.constituents.len());
            universe.constituents.push(Constituent::from(row));
        }
        universe
    }

    /// All constituents.
    pub fn constituents(&self) -> &[Constituent] {
        &self.constituents
    }

    /// Number of constituents.
    pub fn len(&self) -> usize {
        self.constituents.len()
    }

    /// Whether the universe is empty (e.g. the source could not be fetched).
    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }

    /// Look up a constituent by symbol.
    pub fn get(&self, symbol: &str) -> Option<&Constituent> {
        self.index.get(symbol).map(|&i| &self.constituents[i])
    }

    /// GICS sector of `symbol`.
    pub fn sector(&self, symbol: &str) -> Option<GicsSector> {
        self.get(symbol).and_then(|c| c.gics)
    }

    /// Distinct listed sector names, sorted.
    pub fn sectors(&self) -> Vec<String> {
        self.constituents
            .iter()
            .filter_map(|c| c.sector.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Constituent count per listed sector.
    pub fn sector_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for sector in self.constituents.iter().filter_map(|c| c.sector.as_ref()) {
            *counts.entry(sector.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Constituents in any of `sectors` whose symbol or name contains `search`.
    ///
    /// An empty sector list keeps every sector; a blank search keeps every name.
    pub fn filter(&self, sectors: &[String], search: &str) -> Vec<&Constituent> {
        let needle = search.trim().to_lowercase();
        self.constituents
            .iter()
            .filter(|c| {
                sectors.is_empty()
                    || c.sector
                        .as_ref()
                        .is_some_and(|s| sectors.iter().any(|wanted| wanted == s))
            })
            .filter(|c| needle.is_empty() || c.matches(&needle))
            .collect()
    }
}
