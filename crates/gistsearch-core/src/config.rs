//! Centralized configuration for the gist search service.
//!
//! Compile-time defaults live on the `*Config` structs as associated
//! constants. Runtime values (the GitHub token, overrides) are collected into
//! [`Settings`], normally via [`Settings::from_env`].

use crate::{GistError, Result};
use std::time::Duration;
use tracing::debug;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const GITHUB_API_BASE: &'static str = "https://api.github.com";
    pub const GITHUB_ACCEPT: &'static str = "application/vnd.github+json";
    pub const USER_AGENT: &'static str = concat!("gistsearch/", env!("CARGO_PKG_VERSION"));
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const RETRY_ATTEMPTS: u32 = 3;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
    pub const THROTTLE_DELAY: Duration = Duration::from_millis(500);
    pub const RAW_CACHE_CAPACITY: u64 = 512;
    pub const RAW_CACHE_TTL: Duration = Duration::from_secs(600);
    pub const MAX_CONCURRENT_FETCHES: usize = 4;
}

/// Search request defaults and limits.
pub struct SearchConfig;

impl SearchConfig {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_PER_PAGE: u32 = 10;
    pub const MAX_PER_PAGE: u32 = 100;
    /// Upper bound on compiled regex size, in bytes.
    pub const PATTERN_SIZE_LIMIT: usize = 1 << 20;
}

/// HTTP server defaults.
pub struct ServerConfig;

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 9876;
    pub const REQUEST_BODY_LIMIT: usize = 64 * 1024;
}

/// Environment variable names.
pub struct EnvVars;

impl EnvVars {
    pub const GITHUB_TOKEN: &'static str = "GITHUB_TOKEN";
    pub const GITHUB_API_URL: &'static str = "GITHUB_API_URL";
    pub const REQUEST_TIMEOUT_SECS: &'static str = "GISTSEARCH_REQUEST_TIMEOUT_SECS";
    pub const MAX_CONCURRENT_FETCHES: &'static str = "GISTSEARCH_MAX_CONCURRENT_FETCHES";
}

/// Runtime settings for the GitHub client and search engine.
#[derive(Clone)]
pub struct Settings {
    /// Personal access token sent as `Authorization: token <...>`.
    pub github_token: String,
    /// Base URL of the GitHub REST API.
    pub github_api_url: String,
    pub request_timeout: Duration,
    /// How many gists are fetched in parallel per search.
    pub max_concurrent_fetches: usize,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("github_token", &"<redacted>")
            .field("github_api_url", &self.github_api_url)
            .field("request_timeout", &self.request_timeout)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .finish()
    }
}

impl Settings {
    /// Create settings with defaults for everything except the token.
    pub fn new(github_token: impl Into<String>) -> Self {
        Self {
            github_token: github_token.into(),
            github_api_url: NetworkConfig::GITHUB_API_BASE.to_string(),
            request_timeout: NetworkConfig::REQUEST_TIMEOUT,
            max_concurrent_fetches: NetworkConfig::MAX_CONCURRENT_FETCHES,
        }
    }

    /// Override the GitHub API base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n.max(1);
        self
    }

    /// Load settings from the process environment.
    ///
    /// A `.env` file in the working directory (or a parent) is loaded first;
    /// variables already set in the environment take precedence over it.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(GistError::Config {
                    message: format!("Failed to load .env file: {}", e),
                })
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(EnvVars::GITHUB_TOKEN)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GistError::Config {
                message: format!("{} is not set", EnvVars::GITHUB_TOKEN),
            })?;

        let mut settings = Self::new(token);

        if let Some(url) = lookup(EnvVars::GITHUB_API_URL).filter(|u| !u.trim().is_empty()) {
            url::Url::parse(url.trim()).map_err(|e| GistError::Config {
                message: format!("{} is not a valid URL: {}", EnvVars::GITHUB_API_URL, e),
            })?;
            settings = settings.with_api_url(url.trim());
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, EnvVars::REQUEST_TIMEOUT_SECS)? {
            settings = settings.with_request_timeout(Duration::from_secs(secs));
        }

        if let Some(n) = parse_var::<usize, _>(&lookup, EnvVars::MAX_CONCURRENT_FETCHES)? {
            settings = settings.with_max_concurrent_fetches(n);
        }

        Ok(settings)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| GistError::Config {
                message: format!("{} has invalid value {:?}: {}", key, raw, e),
            }),
        _ => Ok(None),
    }
}
