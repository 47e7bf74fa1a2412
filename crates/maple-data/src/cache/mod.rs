//! Caching layer for provider results.

pub mod policy;
pub mod sqlite;

pub use policy::{CacheOperation, CachePolicy};
pub use sqlite::{CacheStats, SqliteCache};
