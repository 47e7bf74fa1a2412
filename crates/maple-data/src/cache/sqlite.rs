//! SQLite key/value cache with per-entry expiry.

use crate::cache::policy::CacheOperation;
use crate::error::{DataError, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// SQLite cache keyed by (operation, key) holding a JSON payload and its expiry.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Open or create a cache database at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS entries (
                operation TEXT NOT NULL,
                key TEXT NOT NULL,
                payload TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                PRIMARY KEY (operation, key)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_entries_expiry ON entries(expires_at)",
            [],
        )?;

        Ok(())
    }

    /// Fetch a live entry, or `None` when missing or expired.
    pub fn get<T: DeserializeOwned>(&self, operation: CacheOperation, key: &str) -> Result<Option<T>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM entries
                 WHERE operation = ?1 AND key = ?2 AND expires_at > ?3",
                params![operation.as_str(), key, Utc::now().timestamp()],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|p| serde_json::from_str(&p).map_err(DataError::from))
            .transpose()
    }

    /// Store `value` under (operation, key), replacing any previous entry.
    pub fn put<T: Serialize>(
        &self,
        operation: CacheOperation,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        let now = Utc::now();
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| DataError::Cache(format!("TTL too large: {ttl:?}")))?;

        self.conn.execute(
            "INSERT OR REPLACE INTO entries (operation, key, payload, cached_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                operation.as_str(),
                key,
                payload,
                now.to_rfc3339(),
                now.timestamp().saturating_add(ttl_secs),
            ],
        )?;
        Ok(())
    }

    /// Remove a single entry.
    pub fn invalidate(&self, operation: CacheOperation, key: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM entries WHERE operation = ?1 AND key = ?2",
            params![operation.as_str(), key],
        )?;
        Ok(())
    }

    /// Remove every entry of one operation.
    pub fn clear_operation(&self, operation: CacheOperation) -> Result<()> {
        self.conn.execute(
            "DELETE FROM entries WHERE operation = ?1",
            params![operation.as_str()],
        )?;
        Ok(())
    }

    /// Clear all cached data.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM entries", [])?;
        Ok(())
    }

    /// Delete expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM entries WHERE expires_at <= ?1",
            params![Utc::now().timestamp()],
        )?;
        Ok(removed)
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let now = Utc::now().timestamp();

        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;

        let expired: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE expires_at <= ?1",
            params![now],
            |row| row.get(0),
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT operation, COUNT(*) FROM entries GROUP BY operation")?;
        let by_operation = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok((row.get::<_, String>(0)?, count as usize))
            })?
            .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;

        Ok(CacheStats {
            total_entries: total as usize,
            expired_entries: expired as usize,
            by_operation,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of stored entries, live or expired
    pub total_entries: usize,
    /// Entries past their expiry
    pub expired_entries: usize,
    /// Entry count per operation name
    pub by_operation: BTreeMap<String, usize>,
}

impl CacheStats {
    /// Entries still fresh.
    pub const fn live_entries(&self) -> usize {
        self.total_entries.saturating_sub(self.expired_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_cache_initialization() {
        let cache = SqliteCache::in_memory();
        assert!(cache.is_ok());
    }

    #[test]
    fn test_put_and_get() {
        let cache = SqliteCache::in_memory().unwrap();
        let value = vec![("RY.TO".to_string(), 1.5_f64)];

        cache
            .put(CacheOperation::Search, "royal", &value, HOUR)
            .unwrap();

        let cached: Option<Vec<(String, f64)>> =
            cache.get(CacheOperation::Search, "royal").unwrap();
        assert_eq!(cached, Some(value));

        // Same key under another operation is a separate entry
        let other: Option<Vec<(String, f64)>> = cache.get(CacheOperation::News, "royal").unwrap();
        assert_eq!(other, None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = SqliteCache::in_memory().unwrap();
        cache
            .put(CacheOperation::News, "feed", &"headline", Duration::ZERO)
            .unwrap();

        let cached: Option<String> = cache.get(CacheOperation::News, "feed").unwrap();
        assert_eq!(cached, None);

        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.get_stats().unwrap().total_entries, 0);
    }

    #[test]
    fn test_put_replaces_existing() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put(CacheOperation::Profile, "TD.TO", &1, HOUR).unwrap();
        cache.put(CacheOperation::Profile, "TD.TO", &2, HOUR).unwrap();

        let cached: Option<i32> = cache.get(CacheOperation::Profile, "TD.TO").unwrap();
        assert_eq!(cached, Some(2));
        assert_eq!(cache.get_stats().unwrap().total_entries, 1);
    }

    #[test]
    fn test_clear_operations() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put(CacheOperation::Prices, "RY.TO|1y", &[1.0, 2.0], HOUR).unwrap();
        cache.put(CacheOperation::Prices, "TD.TO|1y", &[3.0], HOUR).unwrap();
        cache.put(CacheOperation::Universe, "tsx", &["RY.TO"], HOUR).unwrap();

        cache.invalidate(CacheOperation::Prices, "RY.TO|1y").unwrap();
        let stats = cache.get_stats().unwrap();
        assert_eq!(stats.by_operation.get("prices"), Some(&1));

        cache.clear_operation(CacheOperation::Prices).unwrap();
        let stats = cache.get_stats().unwrap();
        assert_eq!(stats.by_operation.get("prices"), None);
        assert_eq!(stats.total_entries, 1);

        cache.clear_all().unwrap();
        assert_eq!(cache.get_stats().unwrap(), CacheStats::default());
    }

    #[test]
    fn test_cache_stats() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put(CacheOperation::Search, "a", &1, HOUR).unwrap();
        cache.put(CacheOperation::Search, "b", &2, Duration::ZERO).unwrap();

        let stats = cache.get_stats().unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.live_entries(), 1);
    }

    #[test]
    fn test_corrupt_payload_is_an_error() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put(CacheOperation::Search, "q", &"text", HOUR).unwrap();
        let result: Result<Option<Vec<f64>>> = cache.get(CacheOperation::Search, "q");
        assert!(matches!(result, Err(DataError::Serialization(_))));
    }
}
