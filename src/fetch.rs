//! HTTP fetch capability with exponential backoff retry logic.
//!
//! Both the feed query and the article download go through the [`Fetch`]
//! trait so the pipeline can be driven by an in-memory source in tests.
//!
//! # Architecture
//!
//! - [`Fetch`]: core trait, `fetch(url) -> raw bytes or failure`
//! - [`HttpFetcher`]: `reqwest` implementation with a browser-like
//!   `User-Agent` and a bounded timeout; any non-2xx status is a failure
//! - [`RetryFetch`]: decorator that adds retry logic to any `Fetch`
//!
//! # Retry Strategy
//!
//! - Exponential backoff starting at `base_delay`
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to each delay

use rand::{Rng, rng};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Generic browser identification sent with every request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// Trait for retrieving the raw body behind a URL.
pub trait Fetch {
    /// Fetch `url` and return the response body.
    ///
    /// # Errors
    ///
    /// Network failures, timeouts and non-2xx statuses are all errors.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Box<dyn Error>>;
}

/// `reqwest`-backed [`Fetch`] implementation.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client whose requests are bounded by `timeout`.
    pub fn new(timeout: StdDuration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Box<dyn Error>> {
        let parsed = url::Url::parse(url)?;
        let t0 = Instant::now();
        let response = self.client.get(parsed).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched URL"
        );
        Ok(body.to_vec())
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Fetch`] implementation.
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<'a, T> {
    inner: &'a T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<'a, T> RetryFetch<'a, T>
where
    T: Fetch,
{
    /// Wrap `inner`; `max_retries` counts attempts after the first one.
    pub fn new(inner: &'a T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        if delay.is_zero() {
            return delay;
        }
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetch<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Fetch for RetryFetch<'_, T>
where
    T: Fetch,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Fails a fixed number of times, then succeeds.
    struct Flaky {
        failures_left: Cell<usize>,
        calls: Cell<usize>,
    }

    impl Fetch for Flaky {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err("connection reset".into());
            }
            Ok(b"ok".to_vec())
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failures() {
        let inner = Flaky {
            failures_left: Cell::new(2),
            calls: Cell::new(0),
        };
        let retry = RetryFetch::new(&inner, 2, StdDuration::ZERO);
        let body = retry.fetch("https://example.com").await.unwrap();
        assert_eq!(body, b"ok");
        assert_eq!(inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let inner = Flaky {
            failures_left: Cell::new(10),
            calls: Cell::new(0),
        };
        let retry = RetryFetch::new(&inner, 1, StdDuration::ZERO);
        assert!(retry.fetch("https://example.com").await.is_err());
        assert_eq!(inner.calls.get(), 2);
    }

    #[test]
    fn test_backoff_is_capped() {
        let inner = Flaky {
            failures_left: Cell::new(0),
            calls: Cell::new(0),
        };
        let retry = RetryFetch::new(&inner, 5, StdDuration::from_secs(1));
        let delay = retry.backoff(10);
        assert!(delay >= StdDuration::from_secs(30));
        assert!(delay <= StdDuration::from_millis(30_250));
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_invalid_url() {
        let fetcher = HttpFetcher::new(StdDuration::from_secs(1)).unwrap();
        assert!(fetcher.fetch("not a url").await.is_err());
    }
}
