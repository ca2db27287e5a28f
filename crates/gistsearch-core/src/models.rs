//! Wire types: GitHub gist payloads and the search API's request/response bodies.

use crate::config::SearchConfig;
use crate::{GistError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single file entry inside a gist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GistFile {
    #[serde(default)]
    pub filename: Option<String>,
    pub raw_url: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub truncated: bool,
}

/// Gist metadata as returned by the GitHub REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,
    /// API URL of this gist (`/gists/{id}`).
    pub url: String,
    pub html_url: String,
    /// Files keyed by filename, in the order GitHub lists them.
    #[serde(default)]
    pub files: IndexMap<String, GistFile>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: bool,
}

/// One page of a user's gist listing.
#[derive(Debug, Clone, Default)]
pub struct GistPage {
    pub gists: Vec<Gist>,
    /// Whether GitHub advertised a `rel="next"` page.
    pub more_pages: bool,
}

/// Downloaded content of a single gist file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistFileContent {
    pub filename: String,
    pub content: String,
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub username: String,
    pub pattern: String,
    pub page: u32,
    pub per_page: u32,
}

impl SearchRequest {
    /// Create a request with default pagination.
    pub fn new(username: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            pattern: pattern.into(),
            page: SearchConfig::DEFAULT_PAGE,
            per_page: SearchConfig::DEFAULT_PER_PAGE,
        }
    }

    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    /// Validate a raw JSON request body.
    pub fn from_json(body: &Value) -> Result<Self> {
        let obj = body.as_object().ok_or_else(|| {
            GistError::validation("JSON validation error: request body must be an object")
        })?;

        let username = required_str(obj.get("username"), "username", "Username is required")?;
        if username.is_empty() {
            return Err(GistError::validation("Username is required"));
        }
        // An empty pattern is allowed and matches every file.
        let pattern = required_str(obj.get("pattern"), "pattern", "Pattern is required")?;
        let page = optional_int(obj.get("page"), "page", 1, None)?
            .unwrap_or(SearchConfig::DEFAULT_PAGE);
        let per_page = optional_int(
            obj.get("per_page"),
            "per_page",
            1,
            Some(SearchConfig::MAX_PER_PAGE),
        )?
        .unwrap_or(SearchConfig::DEFAULT_PER_PAGE);

        Ok(Self {
            username,
            pattern,
            page,
            per_page,
        })
    }
}

fn required_str(value: Option<&Value>, field: &str, missing: &str) -> Result<String> {
    match value {
        None | Some(Value::Null) => Err(GistError::validation(missing)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(GistError::validation(format!(
            "JSON validation error: '{}' must be a string",
            field
        ))),
    }
}

fn optional_int(
    value: Option<&Value>,
    field: &str,
    min: u32,
    max: Option<u32>,
) -> Result<Option<u32>> {
    let range_error = || {
        let message = match max {
            Some(max) => format!(
                "JSON validation error: '{}' must be an integer between {} and {}",
                field, min, max
            ),
            None => format!(
                "JSON validation error: '{}' must be an integer >= {}",
                field, min
            ),
        };
        GistError::validation(message)
    };

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let n = v.as_u64().ok_or_else(range_error)?;
            let n = u32::try_from(n).map_err(|_| range_error())?;
            if n < min || max.is_some_and(|max| n > max) {
                return Err(range_error());
            }
            Ok(Some(n))
        }
    }
}

/// A file whose content matched the search pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub gist_id: String,
    pub filename: String,
    /// Browser URL of the gist.
    pub url: String,
}

/// Outcome carried by each streamed search line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "no matches")]
    NoMatches,
}

/// One line of the streamed search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: SearchStatus,
    pub username: String,
    pub pattern: String,
    pub matches: Vec<SearchMatch>,
    pub page: u32,
    pub more_pages: bool,
}

impl SearchResponse {
    /// A `"success"` line carrying one match.
    pub fn matched(request: &SearchRequest, m: SearchMatch, more_pages: bool) -> Self {
        Self {
            status: SearchStatus::Success,
            username: request.username.clone(),
            pattern: request.pattern.clone(),
            matches: vec![m],
            page: request.page,
            more_pages,
        }
    }

    /// The terminal `"no matches"` line.
    pub fn no_matches(request: &SearchRequest, more_pages: bool) -> Self {
        Self {
            status: SearchStatus::NoMatches,
            username: request.username.clone(),
            pattern: request.pattern.clone(),
            matches: Vec::new(),
            page: request.page,
            more_pages,
        }
    }
}

/// Error body returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

impl From<&GistError> for ErrorResponse {
    fn from(err: &GistError) -> Self {
        Self::new(err.client_message())
    }
}
