//! The seam between the search engine and wherever gists come from.

use crate::models::{Gist, GistFileContent, GistPage};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A provider of gist listings and gist file contents.
///
/// [`crate::network::GitHubGistClient`] is the production implementation.
#[async_trait]
pub trait GistSource: Send + Sync {
    /// List one page of a user's gists.
    async fn list_user_gists(&self, username: &str, page: u32, per_page: u32) -> Result<GistPage>;

    /// Fetch every file of a gist, in the gist's file order.
    async fn gist_files(&self, gist: &Gist) -> Result<Vec<GistFileContent>>;
}

pub type DynGistSource = Arc<dyn GistSource>;
