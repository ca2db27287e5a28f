//! Authenticated GitHub HTTP client with rate limit awareness.
//!
//! Wraps reqwest with:
//! - `Authorization: token ...` on every request
//! - Rate limit tracking from `X-RateLimit-*` response headers
//! - Brief throttling when the remaining budget runs low
//! - Mapping of non-2xx responses onto [`GistError`]

use crate::config::NetworkConfig;
use crate::{GistError, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Rate limit state extracted from response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Remaining requests allowed.
    pub remaining: Option<u64>,
    /// Total request limit.
    pub limit: Option<u64>,
    /// Unix timestamp when the rate limit resets.
    pub reset: Option<u64>,
}

impl RateLimitState {
    /// Throttle when below 10% of the limit.
    pub fn should_throttle(&self) -> bool {
        match (self.remaining, self.limit) {
            (Some(remaining), Some(limit)) if limit > 0 => {
                let threshold = (limit as f64 * 0.1) as u64;
                remaining < threshold.max(1)
            }
            _ => false,
        }
    }

    /// Time until the rate limit window resets.
    pub fn time_until_reset(&self) -> Option<Duration> {
        let reset = self.reset?;
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        (reset > now).then(|| Duration::from_secs(reset - now))
    }
}

/// HTTP client used for all GitHub traffic.
pub struct HttpClient {
    client: Client,
    rate_limit_remaining: AtomicI64,
    rate_limit_limit: AtomicU64,
    rate_limit_reset: AtomicU64,
    /// Whole-request timeout configured on the underlying client.
    default_timeout: Duration,
    throttle_delay: Duration,
}

impl HttpClient {
    /// Create a client that authenticates with `token`.
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("token {}", token)).map_err(|_| {
            GistError::Config {
                message: "GITHUB_TOKEN contains characters not allowed in a header".to_string(),
            }
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| GistError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                context: None,
                source: Some(e),
            })?;

        Ok(Self {
            client,
            rate_limit_remaining: AtomicI64::new(-1),
            rate_limit_limit: AtomicU64::new(0),
            rate_limit_reset: AtomicU64::new(0),
            default_timeout: timeout,
            throttle_delay: NetworkConfig::THROTTLE_DELAY,
        })
    }

    /// Current rate limit state as last reported by GitHub.
    pub fn rate_limit_state(&self) -> RateLimitState {
        let remaining = self.rate_limit_remaining.load(Ordering::SeqCst);
        let limit = self.rate_limit_limit.load(Ordering::SeqCst);
        let reset = self.rate_limit_reset.load(Ordering::SeqCst);
        RateLimitState {
            remaining: (remaining >= 0).then_some(remaining as u64),
            limit: (limit > 0).then_some(limit),
            reset: (reset > 0).then_some(reset),
        }
    }

    /// GET a GitHub API endpoint, optionally with query parameters.
    pub async fn get_api(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        self.maybe_throttle().await;

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, NetworkConfig::GITHUB_ACCEPT)
            .query(query)
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;

        self.update_rate_limits(response.headers());
        self.check_response_status(response).await
    }

    /// Read a successful API response body as JSON.
    pub async fn json<T: DeserializeOwned>(&self, url: &str, response: Response) -> Result<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.request_error(url, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GET raw file content as text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.maybe_throttle().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;

        self.update_rate_limits(response.headers());
        let response = self.check_response_status(response).await?;
        response.text().await.map_err(|e| self.request_error(url, e))
    }

    async fn maybe_throttle(&self) {
        let state = self.rate_limit_state();
        if state.should_throttle() {
            warn!(
                "Rate limit approaching (remaining: {:?}/{:?}), throttling for {:?}",
                state.remaining, state.limit, self.throttle_delay
            );
            tokio::time::sleep(self.throttle_delay).await;
        }
    }

    fn update_rate_limits(&self, headers: &HeaderMap) {
        if let Some(num) = header_num::<i64>(headers, "x-ratelimit-remaining") {
            self.rate_limit_remaining.store(num, Ordering::SeqCst);
        }
        if let Some(num) = header_num::<u64>(headers, "x-ratelimit-limit") {
            self.rate_limit_limit.store(num, Ordering::SeqCst);
        }
        if let Some(num) = header_num::<u64>(headers, "x-ratelimit-reset") {
            self.rate_limit_reset.store(num, Ordering::SeqCst);
        }
    }

    async fn check_response_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let service = response
            .url()
            .host_str()
            .unwrap_or("unknown")
            .to_string();

        let exhausted = header_num::<u64>(response.headers(), "x-ratelimit-remaining") == Some(0);
        let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN && exhausted);
        if rate_limited {
            let retry_after_secs =
                header_num::<u64>(response.headers(), header::RETRY_AFTER.as_str()).or_else(|| {
                    self.rate_limit_state()
                        .time_until_reset()
                        .map(|d| d.as_secs())
                });
            return Err(GistError::RateLimited {
                service,
                retry_after_secs,
            });
        }

        // GitHub error bodies look like {"message": "Not Found", ...}
        let detail = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from));

        let message = match detail {
            Some(detail) => format!("GitHub API returned {}: {}", status, detail),
            None => format!("GitHub API returned {}", status),
        };
        debug!("{} ({})", message, service);

        Err(GistError::GitHubApi {
            message,
            status_code: Some(status.as_u16()),
            context: None,
        })
    }

    fn request_error(&self, url: &str, err: reqwest::Error) -> GistError {
        if err.is_timeout() {
            return GistError::Timeout(self.default_timeout);
        }
        GistError::Network {
            message: format!("GET {} failed: {}", url, err),
            context: None,
            source: Some(err),
        }
    }
}

fn header_num<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<T>().ok())
}
