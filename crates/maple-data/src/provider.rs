//! Market data provider seam and its Yahoo Finance and cached implementations.
//!
//! Every provider call degrades to an empty result on failure; the failure is
//! logged and never reaches the metric computations.

use crate::cache::{CacheOperation, CachePolicy, CacheStats, SqliteCache};
use crate::error::{DataError, Result};
use crate::http::{DEFAULT_RATE_LIMIT, HttpClient};
use crate::news::{NewsFeed, NewsItem};
use crate::wiki::{UniverseRow, WikiUniverseSource};
use crate::yahoo::{
    DEFAULT_CONCURRENCY, PriceRange, SearchHit, YahooFundamentalsProvider, YahooQuoteProvider,
    search_tsx_symbols,
};
use chrono::NaiveDate;
use maple_metrics::{PricePoint, PriceSeries, Profile, Statements};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of prices, fundamentals, search hits, constituents and news.
#[allow(async_fn_in_trait)]
pub trait MarketDataProvider: fmt::Debug {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Adjusted-close series per symbol. Symbols without data are absent.
    async fn get_prices(
        &self,
        symbols: &[String],
        range: PriceRange,
    ) -> HashMap<String, PriceSeries>;

    /// Issuer profile, empty on failure.
    async fn get_profile(&self, symbol: &str) -> Profile;

    /// Statement tables, empty on failure.
    async fn get_statements(&self, symbol: &str) -> Statements;

    /// TSX listings matching `query`.
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit>;

    /// Index constituents.
    async fn universe(&self) -> Vec<UniverseRow>;

    /// Ranked headlines.
    async fn news(&self, limit: usize) -> Vec<NewsItem>;
}

/// Live Yahoo Finance provider.
#[derive(Debug)]
pub struct YahooProvider {
    http: HttpClient,
    quotes: YahooQuoteProvider,
    fundamentals: YahooFundamentalsProvider,
    news: NewsFeed,
    universe: WikiUniverseSource,
    concurrency: usize,
}

impl YahooProvider {
    /// Provider with default request spacing and concurrency.
    pub fn new() -> Result<Self> {
        Self::with_settings(DEFAULT_RATE_LIMIT, DEFAULT_CONCURRENCY)
    }

    /// Provider with custom request spacing and price-download concurrency.
    pub fn with_settings(rate_limit: Duration, concurrency: usize) -> Result<Self> {
        let http = HttpClient::with_rate_limit(rate_limit)?;
        Ok(Self {
            quotes: YahooQuoteProvider::with_rate_limit(rate_limit)?,
            fundamentals: YahooFundamentalsProvider::new(http.clone()),
            news: NewsFeed::new(http.clone()),
            universe: WikiUniverseSource::new(http.clone()),
            http,
            concurrency: concurrency.max(1),
        })
    }

    /// Constituent source, for changing the page or row limit.
    pub fn with_universe_source(mut self, source: WikiUniverseSource) -> Self {
        self.universe = source;
        self
    }
}

fn or_empty<T: Default>(result: Result<T>, what: &str, symbol: &str) -> T {
    result.unwrap_or_else(|e| {
        warn!(symbol, error = %e, "failed to fetch {what}");
        T::default()
    })
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn get_prices(
        &self,
        symbols: &[String],
        range: PriceRange,
    ) -> HashMap<String, PriceSeries> {
        self.quotes
            .fetch_series_batch(symbols, range, self.concurrency)
            .await
    }

    async fn get_profile(&self, symbol: &str) -> Profile {
        or_empty(self.fundamentals.fetch_profile(symbol).await, "profile", symbol)
    }

    async fn get_statements(&self, symbol: &str) -> Statements {
        or_empty(
            self.fundamentals.fetch_statements(symbol).await,
            "statements",
            symbol,
        )
    }

    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        or_empty(
            search_tsx_symbols(&self.http, query, max_results).await,
            "search results",
            query,
        )
    }

    async fn universe(&self) -> Vec<UniverseRow> {
        self.universe.fetch().await
    }

    async fn news(&self, limit: usize) -> Vec<NewsItem> {
        self.news.fetch(limit).await
    }
}

/// Cache form of a price series; missing values are stored as `null`.
#[derive(Debug, Serialize, Deserialize)]
struct CachedSeries {
    symbol: String,
    points: Vec<(NaiveDate, Option<f64>)>,
}

impl From<&PriceSeries> for CachedSeries {
    fn from(series: &PriceSeries) -> Self {
        Self {
            symbol: series.symbol().to_string(),
            points: series
                .points()
                .iter()
                .map(|p| (p.date, p.is_observed().then_some(p.value)))
                .collect(),
        }
    }
}

impl From<CachedSeries> for PriceSeries {
    fn from(cached: CachedSeries) -> Self {
        let points = cached
            .points
            .into_iter()
            .map(|(date, value)| PricePoint::new(date, value.unwrap_or(f64::NAN)))
            .collect();
        Self::from_unsorted(cached.symbol, points)
    }
}

/// Wraps a provider with the SQLite TTL cache.
///
/// Empty results are never stored, so a failed fetch is retried on the next call.
pub struct CachedProvider<P> {
    inner: P,
    cache: Option<Mutex<SqliteCache>>,
    policy: CachePolicy,
    force_refresh: bool,
}

impl<P: fmt::Debug> fmt::Debug for CachedProvider<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedProvider")
            .field("inner", &self.inner)
            .field("cached", &self.cache.is_some())
            .field("policy", &self.policy)
            .field("force_refresh", &self.force_refresh)
            .finish()
    }
}

impl<P> CachedProvider<P> {
    /// Cache results of `inner` in `cache` with the default policy.
    pub fn new(inner: P, cache: SqliteCache) -> Self {
        Self {
            inner,
            cache: Some(Mutex::new(cache)),
            policy: CachePolicy::default(),
            force_refresh: false,
        }
    }

    /// Pass every call straight through to `inner`.
    pub const fn uncached(inner: P) -> Self {
        Self {
            inner,
            cache: None,
            policy: CachePolicy {
                prices: Duration::ZERO,
                fundamentals: Duration::ZERO,
                metadata: Duration::ZERO,
                search: Duration::ZERO,
                news: Duration::ZERO,
            },
            force_refresh: false,
        }
    }

    /// Override the TTL policy.
    pub const fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Skip cache reads; fresh results still overwrite the cache.
    pub const fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// The wrapped provider.
    pub const fn inner(&self) -> &P {
        &self.inner
    }

    fn with_cache<T>(&self, f: impl FnOnce(&SqliteCache) -> Result<T>) -> Option<Result<T>> {
        let cache = self.cache.as_ref()?;
        Some(match cache.lock() {
            Ok(guard) => f(&guard),
            Err(_) => Err(DataError::Cache("cache lock poisoned".to_string())),
        })
    }

    /// Statistics of the underlying cache, if any.
    pub fn cache_stats(&self) -> Option<Result<CacheStats>> {
        self.with_cache(SqliteCache::get_stats)
    }

    /// Remove every cached entry.
    pub fn clear_cache(&self) -> Option<Result<()>> {
        self.with_cache(SqliteCache::clear_all)
    }

    fn lookup<T: DeserializeOwned>(&self, operation: CacheOperation, key: &str) -> Option<T> {
        if self.force_refresh {
            return None;
        }
        match self.with_cache(|cache| cache.get(operation, key))? {
            Ok(Some(value)) => {
                debug!(%operation, key, "cache hit");
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(%operation, key, error = %e, "cache read failed");
                None
            }
        }
    }

    fn store<T: Serialize>(&self, operation: CacheOperation, key: &str, value: &T) {
        let ttl = self.policy.ttl(operation);
        if let Some(Err(e)) = self.with_cache(|cache| cache.put(operation, key, value, ttl)) {
            warn!(%operation, key, error = %e, "cache write failed");
        }
    }
}

fn price_key(symbol: &str, range: PriceRange) -> String {
    format!("{symbol}|{range}")
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get_prices(
        &self,
        symbols: &[String],
        range: PriceRange,
    ) -> HashMap<String, PriceSeries> {
        let mut result = HashMap::with_capacity(symbols.len());
        let mut missing = Vec::new();

        for symbol in symbols {
            match self.lookup::<CachedSeries>(CacheOperation::Prices, &price_key(symbol, range)) {
                Some(cached) => {
                    result.insert(symbol.clone(), PriceSeries::from(cached));
                }
                None => missing.push(symbol.clone()),
            }
        }

        if !missing.is_empty() {
            let fetched = self.inner.get_prices(&missing, range).await;
            for (symbol, series) in fetched {
                if !series.is_empty() {
                    self.store(
                        CacheOperation::Prices,
                        &price_key(&symbol, range),
                        &CachedSeries::from(&series),
                    );
                }
                result.insert(symbol, series);
            }
        }

        result
    }

    async fn get_profile(&self, symbol: &str) -> Profile {
        if let Some(profile) = self.lookup(CacheOperation::Profile, symbol) {
            return profile;
        }
        let profile = self.inner.get_profile(symbol).await;
        if profile != Profile::default() {
            self.store(CacheOperation::Profile, symbol, &profile);
        }
        profile
    }

    async fn get_statements(&self, symbol: &str) -> Statements {
        if let Some(statements) = self.lookup(CacheOperation::Statements, symbol) {
            return statements;
        }
        let statements = self.inner.get_statements(symbol).await;
        if !statements.is_empty() {
            self.store(CacheOperation::Statements, symbol, &statements);
        }
        statements
    }

    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        let key = format!("{}|{max_results}", query.trim().to_lowercase());
        if let Some(hits) = self.lookup(CacheOperation::Search, &key) {
            return hits;
        }
        let hits = self.inner.search(query, max_results).await;
        if !hits.is_empty() {
            self.store(CacheOperation::Search, &key, &hits);
        }
        hits
    }

    async fn universe(&self) -> Vec<UniverseRow> {
        const KEY: &str = "tsx-composite";
        if let Some(rows) = self.lookup(CacheOperation::Universe, KEY) {
            return rows;
        }
        let rows = self.inner.universe().await;
        if !rows.is_empty() {
            self.store(CacheOperation::Universe, KEY, &rows);
        }
        rows
    }

    async fn news(&self, limit: usize) -> Vec<NewsItem> {
        let key = limit.to_string();
        if let Some(items) = self.lookup(CacheOperation::News, &key) {
            return items;
        }
        let items = self.inner.news(limit).await;
        if !items.is_empty() {
            self.store(CacheOperation::News, &key, &items);
        }
        items
    }
}
