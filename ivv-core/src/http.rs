//! GET-with-retries used by every source provider.
//!
//! Failures never escape this module: once the retry budget is spent the
//! caller gets `None` and treats the source as having no data for this run.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::RetrySettings;
use crate::provider::SourceKind;

const USER_AGENT: &str = concat!("ivv/", env!("CARGO_PKG_VERSION"));

/// Retry budget for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Per-attempt request timeout.
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Linear backoff: the wait after failed attempt `n` (1-based) is `base_delay * n`,
    /// capped at `Duration::MAX`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Why a single attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct RetryingClient {
    http: Client,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(policy: RetryPolicy) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(policy.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { http, policy })
    }

    /// GET `url` and parse the body as JSON, retrying on any failure.
    ///
    /// Returns `None` after `max_attempts` failed attempts.
    pub async fn get_json(
        &self,
        source: SourceKind,
        url: &str,
        params: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Option<Value> {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.attempt(url, params, headers).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(%source, url, attempt, "request succeeded after retry");
                    }
                    return Some(value);
                }
                Err(e) => {
                    tracing::warn!(%source, url, attempt, max_attempts, error = %e, "request failed");
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.policy.delay_after(attempt)).await;
            }
        }

        tracing::error!(%source, url, max_attempts, "retries exhausted");
        None
    }

    async fn attempt(
        &self,
        url: &str,
        params: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<Value, FetchError> {
        let mut request = self.http.get(url).query(params);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let res = request.send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
