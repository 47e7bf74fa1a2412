//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then `.env` and process
//! environment, then command-line flags.

use crate::integration::cache_manager;
use maple_data::http::DEFAULT_RATE_LIMIT;
use maple_data::yahoo::DEFAULT_CONCURRENCY;
use std::path::PathBuf;
use std::time::Duration;

/// Cache directory override.
pub(crate) const ENV_CACHE_DIR: &str = "MAPLE_CACHE_DIR";
/// Minimum spacing between provider requests, in milliseconds.
pub(crate) const ENV_RATE_LIMIT_MS: &str = "MAPLE_RATE_LIMIT_MS";
/// Concurrent price downloads.
pub(crate) const ENV_CONCURRENCY: &str = "MAPLE_CONCURRENCY";

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    /// A variable could not be parsed.
    #[error("invalid value '{value}' for {name}: expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    /// Directory holding the cache database
    pub cache_dir: PathBuf,
    /// Minimum spacing between provider requests
    pub rate_limit: Duration,
    /// Concurrent price downloads
    pub concurrency: usize,
    /// Whether the cache is used at all
    pub use_cache: bool,
    /// Whether cached entries are ignored (but still refreshed)
    pub force_refresh: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: cache_manager::default_cache_dir(),
            rate_limit: DEFAULT_RATE_LIMIT,
            concurrency: DEFAULT_CONCURRENCY,
            use_cache: true,
            force_refresh: false,
        }
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ConfigError::Invalid {
            name,
            value: value.to_string(),
            expected: "a positive integer",
        })
}

impl Config {
    /// Defaults overridden by `.env` and the process environment.
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns.
    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_CACHE_DIR).filter(|d| !d.trim().is_empty()) {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(ms) = lookup(ENV_RATE_LIMIT_MS) {
            config.rate_limit = Duration::from_millis(parse_positive(ENV_RATE_LIMIT_MS, &ms)?);
        }
        if let Some(n) = lookup(ENV_CONCURRENCY) {
            let n = parse_positive(ENV_CONCURRENCY, &n)?;
            config.concurrency = usize::try_from(n).unwrap_or(usize::MAX);
        }
        Ok(config)
    }

    /// Apply command-line overrides.
    pub(crate) fn with_flags(
        mut self,
        cache_dir: Option<PathBuf>,
        no_cache: bool,
        refresh: bool,
    ) -> Self {
        if let Some(dir) = cache_dir {
            self.cache_dir = dir;
        }
        self.use_cache = !no_cache;
        self.force_refresh = refresh;
        self
    }

    /// Cache database file.
    pub(crate) fn cache_path(&self) -> PathBuf {
        cache_manager::cache_path(&self.cache_dir)
    }
}
