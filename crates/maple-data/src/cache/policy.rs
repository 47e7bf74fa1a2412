//! Time-to-live policy per cached operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;

/// Kind of provider call whose result is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CacheOperation {
    /// Daily price series
    Prices,
    /// Company profile and key statistics
    Profile,
    /// Financial statement tables
    Statements,
    /// Index constituents
    Universe,
    /// Symbol search hits
    Search,
    /// Aggregated news headlines
    News,
}

impl CacheOperation {
    /// Every operation, in storage order.
    pub const ALL: [Self; 6] = [
        Self::Prices,
        Self::Profile,
        Self::Statements,
        Self::Universe,
        Self::Search,
        Self::News,
    ];

    /// Value stored in the `operation` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Prices => "prices",
            Self::Profile => "profile",
            Self::Statements => "statements",
            Self::Universe => "universe",
            Self::Search => "search",
            Self::News => "news",
        }
    }
}

impl fmt::Display for CacheOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long each operation's results stay fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Price series lifetime
    pub prices: Duration,
    /// Profile and statements lifetime
    pub fundamentals: Duration,
    /// Universe lifetime
    pub metadata: Duration,
    /// Search results lifetime
    pub search: Duration,
    /// News lifetime
    pub news: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            prices: Duration::from_secs(6 * HOUR),
            fundamentals: Duration::from_secs(24 * HOUR),
            metadata: Duration::from_secs(24 * HOUR),
            search: Duration::from_secs(HOUR),
            news: Duration::from_secs(10 * MINUTE),
        }
    }
}

impl CachePolicy {
    /// Time-to-live for `operation`.
    pub const fn ttl(&self, operation: CacheOperation) -> Duration {
        match operation {
            CacheOperation::Prices => self.prices,
            CacheOperation::Profile | CacheOperation::Statements => self.fundamentals,
            CacheOperation::Universe => self.metadata,
            CacheOperation::Search => self.search,
            CacheOperation::News => self.news,
        }
    }
}
