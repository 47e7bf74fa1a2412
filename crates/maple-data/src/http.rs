//! Rate-limited HTTP client shared by the JSON, RSS and wiki collaborators.

use crate::error::{DataError, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Default spacing between requests.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(250);

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Browser-like user agent; Yahoo Finance rejects unidentified clients.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) Maple/0.1";

/// Enforces a minimum interval between requests.
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            last_request: now.checked_sub(min_interval).unwrap_or(now),
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// HTTP client with a browser user agent, timeout and request spacing.
///
/// Cloning is cheap and clones share the same rate limiter.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl HttpClient {
    /// Create a client with the default rate limit and timeout.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(DEFAULT_RATE_LIMIT)
    }

    /// Create a client with a custom minimum interval between requests.
    pub fn with_rate_limit(min_interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .cookie_store(true)
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(min_interval))),
        })
    }

    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        self.rate_limiter.lock().await.wait().await;
        debug!(url, "GET");

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// GET `url` for its side effects (cookies), ignoring the response status.
    pub async fn touch(&self, url: &str) -> Result<()> {
        self.rate_limiter.lock().await.wait().await;
        debug!(url, "GET (status ignored)");
        let _response = self.client.get(url).send().await?;
        Ok(())
    }

    /// GET `url` with query parameters and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.send(url, query).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET `url` with query parameters and return the body as text.
    pub async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let response = self.send(url, query).await?;
        Ok(response.text().await?)
    }
}
