//! Gist Search Core - headless library for regex search over GitHub gists.
//!
//! This crate lists a GitHub user's gists, downloads their files and reports
//! which files match a regular expression. It has no HTTP server of its own;
//! see the `gistsearch-server` crate for the API.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use gistsearch_core::{GistSearchApi, SearchRequest, Settings};
//!
//! #[tokio::main]
//! async fn main() -> gistsearch_core::Result<()> {
//!     let api = GistSearchApi::new(&Settings::from_env()?)?;
//!
//!     let mut lines = api.search(SearchRequest::new("octocat", "fn main")).await?;
//!     while let Some(line) = lines.next().await {
//!         println!("{:?}", line?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod search;
pub mod source;

pub use config::{NetworkConfig, SearchConfig, ServerConfig, Settings};
pub use error::{FetchContext, GistError, Result};
pub use models::{
    ErrorResponse, Gist, GistFile, GistFileContent, GistPage, SearchMatch, SearchRequest,
    SearchResponse, SearchStatus,
};
pub use network::GitHubGistClient;
pub use search::{GistSearcher, SearchPattern, SearchStream};
pub use source::{DynGistSource, GistSource};

use std::sync::Arc;
use tracing::info;

/// Main API struct for gist search.
///
/// Cheap to clone; clones share the HTTP connection pool and file cache.
#[derive(Clone)]
pub struct GistSearchApi {
    searcher: GistSearcher,
}

impl GistSearchApi {
    /// Create an API backed by the GitHub REST API.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = GitHubGistClient::new(settings)?;
        info!(
            "GitHub client ready (api: {}, max concurrent fetches: {})",
            settings.github_api_url, settings.max_concurrent_fetches
        );
        Ok(Self::with_source(
            Arc::new(client),
            settings.max_concurrent_fetches,
        ))
    }

    /// Create an API over an arbitrary gist source.
    pub fn with_source(source: DynGistSource, max_concurrent_fetches: usize) -> Self {
        Self {
            searcher: GistSearcher::new(source, max_concurrent_fetches),
        }
    }

    /// Search one page of a user's gists. See [`GistSearcher::search`].
    pub async fn search(&self, request: SearchRequest) -> Result<SearchStream> {
        self.searcher.search(request).await
    }

    /// Validate a raw JSON body and start a search.
    pub async fn search_json(&self, body: &serde_json::Value) -> Result<SearchStream> {
        let request = SearchRequest::from_json(body)?;
        self.search(request).await
    }
}
