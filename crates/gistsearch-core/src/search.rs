//! Regex search across one page of a user's gists.
//!
//! [`GistSearcher::search`] does the fallible up-front work (pattern
//! compilation, listing the page) eagerly and returns a lazy stream for the
//! rest. Callers can therefore report setup failures as a plain error
//! response, and only file fetch failures surface mid-stream.

use crate::config::{NetworkConfig, SearchConfig};
use crate::models::{Gist, GistFileContent, SearchMatch, SearchRequest, SearchResponse};
use crate::source::DynGistSource;
use crate::{GistError, Result};
use futures::stream::{self, BoxStream, StreamExt};
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

/// A compiled search pattern.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    regex: Regex,
}

impl SearchPattern {
    pub fn compile(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .size_limit(SearchConfig::PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| GistError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { regex })
    }

    /// Whether the pattern matches anywhere in `content`.
    pub fn is_match(&self, content: &str) -> bool {
        self.regex.is_match(content)
    }
}

/// Stream of response lines produced by a search.
pub type SearchStream = BoxStream<'static, Result<SearchResponse>>;

/// Runs searches against a [`crate::GistSource`].
#[derive(Clone)]
pub struct GistSearcher {
    source: DynGistSource,
    max_concurrent_fetches: usize,
}

impl GistSearcher {
    pub fn new(source: DynGistSource, max_concurrent_fetches: usize) -> Self {
        Self {
            source,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    pub fn with_default_concurrency(source: DynGistSource) -> Self {
        Self::new(source, NetworkConfig::MAX_CONCURRENT_FETCHES)
    }

    /// Start a search.
    ///
    /// Fails before any line is produced if the pattern does not compile or
    /// the gist page cannot be listed. The returned stream yields one
    /// `"success"` line per matching file, in listing order, or a single
    /// `"no matches"` line. A file fetch failure yields one `Err` and ends
    /// the stream.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchStream> {
        let pattern = SearchPattern::compile(&request.pattern)?;

        let page = self
            .source
            .list_user_gists(&request.username, request.page, request.per_page)
            .await?;
        let more_pages = page.more_pages;

        debug!(
            "Searching {} gists of {} for {:?}",
            page.gists.len(),
            request.username,
            request.pattern
        );

        let source = self.source.clone();
        let fetched = stream::iter(page.gists)
            .map(move |gist| {
                let source = source.clone();
                async move {
                    let files = source.gist_files(&gist).await;
                    (gist, files)
                }
            })
            .buffered(self.max_concurrent_fetches);

        let state = SearchState {
            fetched: fetched.boxed(),
            pending: Vec::new(),
            pattern,
            request,
            more_pages,
            matched: 0,
            done: false,
        };

        Ok(stream::unfold(state, SearchState::next_line).boxed())
    }
}

type FetchedGists = BoxStream<'static, (Gist, Result<Vec<GistFileContent>>)>;

struct SearchState {
    fetched: FetchedGists,
    /// Matches from the current gist not yet emitted, in reverse order.
    pending: Vec<SearchMatch>,
    pattern: SearchPattern,
    request: SearchRequest,
    more_pages: bool,
    matched: usize,
    done: bool,
}

impl SearchState {
    async fn next_line(mut self) -> Option<(Result<SearchResponse>, Self)> {
        loop {
            if let Some(m) = self.pending.pop() {
                self.matched += 1;
                let line = SearchResponse::matched(&self.request, m, self.more_pages);
                return Some((Ok(line), self));
            }

            if self.done {
                return None;
            }

            match self.fetched.next().await {
                Some((gist, Ok(files))) => {
                    self.pending = matching_files(&self.pattern, &gist, &files);
                    self.pending.reverse();
                }
                Some((gist, Err(e))) => {
                    warn!("Search aborted while fetching gist {}: {}", gist.id, e);
                    self.done = true;
                    return Some((Err(e), self));
                }
                None => {
                    self.done = true;
                    if self.matched == 0 {
                        let line = SearchResponse::no_matches(&self.request, self.more_pages);
                        return Some((Ok(line), self));
                    }
                    return None;
                }
            }
        }
    }
}

fn matching_files(
    pattern: &SearchPattern,
    gist: &Gist,
    files: &[GistFileContent],
) -> Vec<SearchMatch> {
    files
        .iter()
        .filter(|f| pattern.is_match(&f.content))
        .map(|f| SearchMatch {
            gist_id: gist.id.clone(),
            filename: f.filename.clone(),
            url: gist.html_url.clone(),
        })
        .collect()
}
