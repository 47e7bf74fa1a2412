//! Location and opening of the SQLite response cache.

use maple_data::cache::SqliteCache;
use maple_data::error::DataError;
use std::path::{Path, PathBuf};

/// Cache database file name.
pub(crate) const CACHE_FILE: &str = "maple.db";

/// Get the default cache directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/maple/`
/// - macOS: `~/Library/Caches/maple/`
/// - Windows: `%LOCALAPPDATA%\maple\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("maple")
}

/// Cache database path inside `dir`.
pub(crate) fn cache_path(dir: &Path) -> PathBuf {
    dir.join(CACHE_FILE)
}

/// Open the cache at `path`, creating the directory if needed.
pub(crate) fn open_cache(path: &Path) -> Result<SqliteCache, DataError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    SqliteCache::new(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_dir_is_namespaced() {
        assert!(default_cache_dir().ends_with("maple"));
        assert_eq!(
            cache_path(Path::new("/var/cache/maple")),
            PathBuf::from("/var/cache/maple/maple.db")
        );
    }

    #[test]
    fn test_open_cache_creates_directory() {
        let dir = std::env::temp_dir().join(format!("maple-cache-test-{}", std::process::id()));
        let path = cache_path(&dir.join("nested"));
        let cache = open_cache(&path).unwrap();
        assert_eq!(cache.get_stats().unwrap().total_entries, 0);
        drop(cache);
        std::fs::remove_dir_all(dir).ok();
    }
}
