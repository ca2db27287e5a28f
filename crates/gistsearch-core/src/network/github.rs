//! GitHub gist client.
//!
//! Provides:
//! - Paginated listing of a user's gists (`GET /users/{user}/gists`)
//! - Gist detail fetch and raw file download
//! - An in-memory TTL cache for raw file bodies
//! - Retry with backoff on transient failures

use crate::config::{NetworkConfig, Settings};
use crate::error::FetchContext;
use crate::models::{Gist, GistFileContent, GistPage};
use crate::network::client::{HttpClient, RateLimitState};
use crate::network::link;
use crate::network::retry::{retry_async, RetryConfig};
use crate::source::GistSource;
use crate::{GistError, Result};
use async_trait::async_trait;
use mini_moka::sync::Cache;
use reqwest::header;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Cache of raw gist file bodies keyed by `raw_url`.
///
/// Raw URLs embed the revision SHA, so an entry never goes stale; the TTL
/// only bounds memory held for gists nobody searches anymore.
pub struct RawFileCache {
    cache: Cache<String, Arc<str>>,
}

impl RawFileCache {
    pub fn new(capacity: u64, ttl: std::time::Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn get(&self, raw_url: &str) -> Option<Arc<str>> {
        self.cache.get(&raw_url.to_string())
    }

    pub fn insert(&self, raw_url: &str, content: Arc<str>) {
        self.cache.insert(raw_url.to_string(), content);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for RawFileCache {
    fn default() -> Self {
        Self::new(NetworkConfig::RAW_CACHE_CAPACITY, NetworkConfig::RAW_CACHE_TTL)
    }
}

/// GitHub REST API client for gists.
pub struct GitHubGistClient {
    http: Arc<HttpClient>,
    api_base: Url,
    raw_cache: RawFileCache,
    retry: RetryConfig,
}

impl GitHubGistClient {
    /// Create a client from runtime settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let api_base = Url::parse(&settings.github_api_url).map_err(|e| GistError::Config {
            message: format!("Invalid GitHub API URL {:?}: {}", settings.github_api_url, e),
        })?;
        if api_base.cannot_be_a_base() {
            return Err(GistError::Config {
                message: format!("GitHub API URL {:?} cannot be a base", settings.github_api_url),
            });
        }

        let http = HttpClient::new(&settings.github_token, settings.request_timeout)?;
        Ok(Self {
            http: Arc::new(http),
            api_base,
            raw_cache: RawFileCache::default(),
            retry: RetryConfig::default(),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Rate limit state as last reported by GitHub.
    pub fn rate_limit_state(&self) -> RateLimitState {
        self.http.rate_limit_state()
    }

    /// Drop all cached raw file bodies.
    pub fn clear_cache(&self) {
        self.raw_cache.invalidate_all();
    }

    /// `{base}/users/{username}/gists`, with the username percent-encoded.
    fn user_gists_url(&self, username: &str) -> Url {
        let mut url = self.api_base.clone();
        // cannot_be_a_base was rejected in new(), so this always succeeds
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["users", username, "gists"]);
        }
        url
    }

    async fn fetch_gist(&self, gist_url: &str) -> Result<Gist> {
        retry_async(&self.retry, "fetch gist", || async move {
            let response = self.http.get_api(gist_url, &[]).await?;
            self.http.json::<Gist>(gist_url, response).await
        })
        .await
    }

    async fn fetch_raw(&self, raw_url: &str) -> Result<Arc<str>> {
        if let Some(content) = self.raw_cache.get(raw_url) {
            debug!("Raw file cache hit for {}", raw_url);
            return Ok(content);
        }

        let content: Arc<str> = retry_async(&self.retry, "fetch raw file", || async move {
            self.http.get_text(raw_url).await
        })
        .await?
        .into();

        self.raw_cache.insert(raw_url, content.clone());
        Ok(content)
    }
}

#[async_trait]
impl GistSource for GitHubGistClient {
    async fn list_user_gists(&self, username: &str, page: u32, per_page: u32) -> Result<GistPage> {
        let url = self.user_gists_url(username);
        let query = [("page", page.to_string()), ("per_page", per_page.to_string())];

        let page_result = retry_async(&self.retry, "list gists", || {
            let url = url.as_str();
            let query = &query;
            async move {
                let response = self.http.get_api(url, query).await?;
                let more_pages = response
                    .headers()
                    .get(header::LINK)
                    .and_then(|v| v.to_str().ok())
                    .map(link::has_next_page)
                    .unwrap_or(false);
                let gists = self.http.json::<Vec<Gist>>(url, response).await?;
                Ok(GistPage { gists, more_pages })
            }
        })
        .await
        .map_err(|e| e.with_context(FetchContext::GistList))?;

        info!(
            "Listed {} gists for {} (page {}, more_pages={})",
            page_result.gists.len(),
            username,
            page,
            page_result.more_pages
        );
        Ok(page_result)
    }

    async fn gist_files(&self, gist: &Gist) -> Result<Vec<GistFileContent>> {
        let detail = self
            .fetch_gist(&gist.url)
            .await
            .map_err(|e| e.with_context(FetchContext::Gist))?;

        let mut files = Vec::with_capacity(detail.files.len());
        for (filename, file) in &detail.files {
            let content = self
                .fetch_raw(&file.raw_url)
                .await
                .map_err(|e| e.with_context(FetchContext::File(filename.clone())))?;
            files.push(GistFileContent {
                filename: filename.clone(),
                content: content.to_string(),
            });
        }

        debug!("Fetched {} files for gist {}", files.len(), detail.id);
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base: &str) -> GitHubGistClient {
        GitHubGistClient::new(&Settings::new("token").with_api_url(base)).unwrap()
    }

    #[test]
    fn test_user_gists_url() {
        let client = client_for("https://api.github.com");
        assert_eq!(
            client.user_gists_url("octocat").as_str(),
            "https://api.github.com/users/octocat/gists"
        );
    }

    #[test]
    fn test_user_gists_url_with_path_prefix() {
        let client = client_for("https://github.example.com/api/v3");
        assert_eq!(
            client.user_gists_url("octocat").as_str(),
            "https://github.example.com/api/v3/users/octocat/gists"
        );
    }

    #[test]
    fn test_username_is_percent_encoded() {
        let client = client_for("https://api.github.com");
        assert_eq!(
            client.user_gists_url("a/b c").as_str(),
            "https://api.github.com/users/a%2Fb%20c/gists"
        );
    }

    #[test]
    fn test_invalid_api_url() {
        let settings = Settings::new("token").with_api_url("mailto:someone@example.com");
        assert!(matches!(
            GitHubGistClient::new(&settings),
            Err(GistError::Config { .. })
        ));
    }

    #[test]
    fn test_raw_cache_roundtrip() {
        let cache = RawFileCache::default();
        assert!(cache.get("https://gist.githubusercontent.com/raw/a").is_none());
        cache.insert("https://gist.githubusercontent.com/raw/a", Arc::from("hello"));
        assert_eq!(
            cache.get("https://gist.githubusercontent.com/raw/a").as_deref(),
            Some("hello")
        );
        cache.invalidate_all();
        assert!(cache.get("https://gist.githubusercontent.com/raw/a").is_none());
    }
}
