//! HTTP plumbing for catalog requests.
//!
//! A catalog talks to exactly one API host, so an [`HttpClient`] is bound to a
//! single endpoint: it spaces its own requests, retries what is worth retrying
//! and turns everything else into an [`Error`].
//!
//! Retry policy:
//!
//! | answer                   | retried | delay                                  |
//! |--------------------------|---------|----------------------------------------|
//! | 2xx                      | -       | -                                      |
//! | 429 Too Many Requests    | yes     | `Retry-After` seconds, else 2^attempt s |
//! | 5xx                      | yes     | 2^attempt s                            |
//! | other 4xx                | no      | -                                      |
//! | transport error/timeout  | yes     | 1 s                                    |
//!
//! Every attempt is bounded by the shared client's 30 second timeout.
//!
//! # Examples
//!
//! ```rust
//! use kensaku::net::HttpClient;
//!
//! # async fn example() -> kensaku::Result<()> {
//! let client = HttpClient::new("anilist")
//!     .with_rate_limit(250)
//!     .with_max_retries(2);
//!
//! let json: serde_json::Value = client.get_json("https://api.example.com/search").await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use reqwest::{
    Client, ClientBuilder, StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{Error, Result};

/// Upper bound for a single catalog HTTP attempt.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest `Retry-After` the client is willing to sit out.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

const TRANSPORT_RETRY_DELAY: Duration = Duration::from_secs(1);

static CLIENT: Lazy<Client> = Lazy::new(|| {
    client_builder(true).build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "HTTP client setup failed, using a minimal client");
        client_builder(false).build().unwrap_or_default()
    })
});

/// Builder for the shared client. The minimal variant skips pooling and
/// compression but keeps the timeout.
fn client_builder(tuned: bool) -> ClientBuilder {
    let builder = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("kensaku/", env!("CARGO_PKG_VERSION")));
    if tuned {
        builder.pool_max_idle_per_host(4).gzip(true).brotli(true)
    } else {
        builder
    }
}

/// Minimum spacing between requests to one endpoint.
///
/// Clones share the same clock, so every clone of an [`HttpClient`] counts
/// against one budget.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    next_slot: Arc<Mutex<Option<Instant>>>,
    spacing: Duration,
}

impl RateLimiter {
    pub fn new(spacing_ms: u64) -> Self {
        Self {
            next_slot: Arc::new(Mutex::new(None)),
            spacing: Duration::from_millis(spacing_ms),
        }
    }

    /// Reserves the next free slot and sleeps until it starts.
    ///
    /// Slots are reserved under the lock, so concurrent callers queue up one
    /// spacing apart instead of firing together.
    pub async fn wait(&self) {
        let slot = {
            let mut next_slot = self.next_slot.lock();
            let now = Instant::now();
            let slot = next_slot.map_or(now, |next| next.max(now));
            *next_slot = Some(slot + self.spacing);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}

/// How long to wait before retry number `attempt` (starting at 1).
///
/// A server-provided `Retry-After` wins, capped at [`MAX_RETRY_AFTER`];
/// otherwise the delay doubles per attempt.
pub fn backoff(attempt: u32, retry_after: Option<u64>) -> Duration {
    match retry_after {
        Some(secs) => Duration::from_secs(secs).min(MAX_RETRY_AFTER),
        None => Duration::from_secs(2_u64.saturating_pow(attempt)),
    }
}

/// `Retry-After` in whole seconds. HTTP-date values are not supported.
fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// What a failed attempt means for the retry loop.
enum Failure {
    Retry { delay: Duration, error: Error },
    Fatal(Error),
}

/// Rate-limited, retrying GET client for one catalog endpoint.
#[derive(Clone, Debug)]
pub struct HttpClient {
    endpoint: String,
    rate_limiter: RateLimiter,
    max_retries: u32,
    headers: HeaderMap,
}

impl HttpClient {
    /// A client spacing requests 200ms apart with up to 3 retries.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            rate_limiter: RateLimiter::new(200),
            max_retries: 3,
            headers: HeaderMap::new(),
        }
    }

    /// Name used in logs and in [`Error::Catalog`].
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn with_rate_limit(mut self, spacing_ms: u64) -> Self {
        self.rate_limiter = RateLimiter::new(spacing_ms);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sends `name: value` with every request. Invalid headers are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (name.parse::<HeaderName>(), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::debug!(
                endpoint = %self.endpoint,
                header = name,
                "skipping invalid header"
            ),
        }
        self
    }

    /// Fetches `url`, retrying per the module's retry policy.
    ///
    /// # Errors
    ///
    /// * [`Error::RateLimit`] - Still answered 429 after the last retry
    /// * [`Error::Catalog`] - Any other non-success status
    /// * [`Error::Network`] - Connection failures and timeouts
    pub async fn get(&self, url: &str) -> Result<Bytes> {
        let mut attempt = 0;

        loop {
            self.rate_limiter.wait().await;

            let (delay, error) = match self.attempt(url, attempt + 1).await {
                Ok(body) => return Ok(body),
                Err(Failure::Fatal(error)) => return Err(error),
                Err(Failure::Retry { delay, error }) => (delay, error),
            };

            if attempt >= self.max_retries {
                return Err(error);
            }
            attempt += 1;
            tracing::debug!(
                endpoint = %self.endpoint,
                attempt,
                ?delay,
                error = %error,
                "retrying catalog request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One request. `next_attempt` numbers the retry a failure would lead to.
    async fn attempt(
        &self,
        url: &str,
        next_attempt: u32,
    ) -> std::result::Result<Bytes, Failure> {
        let response = match CLIENT.get(url).headers(self.headers.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                return Err(Failure::Retry {
                    delay: TRANSPORT_RETRY_DELAY,
                    error: e.into(),
                });
            }
        };

        let status = response.status();
        if status.is_success() {
            return response.bytes().await.map_err(|e| Failure::Fatal(e.into()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after(response.headers());
            return Err(Failure::Retry {
                delay: backoff(next_attempt, retry_after),
                error: Error::rate_limit(retry_after),
            });
        }

        let error = Error::catalog(&self.endpoint, format!("HTTP {}", status));
        if status.is_server_error() {
            Err(Failure::Retry {
                delay: backoff(next_attempt, None),
                error,
            })
        } else {
            Err(Failure::Fatal(error))
        }
    }

    /// [`get`](Self::get) followed by JSON decoding.
    pub async fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.get(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
