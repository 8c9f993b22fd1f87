//! Read-side http fetching.
//!
//! Idempotent GET requests are retried with exponential backoff, but only on
//! network-class failures (connection errors and timeouts). A response with
//! an error status is returned to the caller right away.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::{Error, ErrorKind, Result};

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 4,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following the failed attempt `attempt`
    /// (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delays between consecutive attempts.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.attempts.saturating_sub(1))
            .map(|a| self.delay(a))
            .collect()
    }
}

/// Whether the error is worth another attempt.
pub fn is_retryable(error: &Error) -> bool {
    match &error.kind {
        ErrorKind::ReqwestError(e) => e.is_connect() || e.is_timeout(),
        _ => false,
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error or runs out
/// of attempts.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_retryable(&e) && attempt + 1 < policy.attempts => {
                let delay = policy.delay(attempt);
                tracing::debug!(attempt, ?delay, "request failed, retrying: {e}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Fetches `url`, retrying on network failures.
pub async fn get(client: &reqwest::Client, url: &str, policy: &RetryPolicy) -> Result<reqwest::Response> {
    retry(policy, || async move {
        let response = client.get(url).send().await?;
        Ok(response.error_for_status()?)
    })
    .await
}

pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    policy: &RetryPolicy,
) -> Result<T> {
    Ok(get(client, url, policy).await?.json::<T>().await?)
}

/// Fetches the body of `url` as text with a one-off client.
pub async fn fetch_text(url: &str, policy: &RetryPolicy) -> Result<String> {
    let client = reqwest::Client::new();
    Ok(get(&client, url, policy).await?.text().await?)
}
