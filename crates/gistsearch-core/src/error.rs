//! Error types for the gist search library.
//!
//! Every fallible operation returns [`GistError`]. The HTTP layer turns these
//! into a status code and a user-facing message via [`GistError::http_status`]
//! and [`GistError::client_message`].

use thiserror::Error;

/// Which GitHub call an upstream failure came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchContext {
    /// Listing a user's gists.
    GistList,
    /// Fetching a single gist's metadata.
    Gist,
    /// Downloading a gist file's raw content.
    File(String),
}

/// Main error type for the gist search library.
#[derive(Debug, Error)]
pub enum GistError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        context: Option<FetchContext>,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    // GitHub API errors
    #[error("GitHub API error: {message}")]
    GitHubApi {
        message: String,
        status_code: Option<u16>,
        context: Option<FetchContext>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Request validation errors
    #[error("{message}")]
    Validation { message: String },

    #[error("Invalid regular expression {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for gist search operations.
pub type Result<T> = std::result::Result<T, GistError>;

impl From<serde_json::Error> for GistError {
    fn from(err: serde_json::Error) -> Self {
        GistError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// `HttpClient` maps its own timeouts to `Timeout` with the configured duration.
impl From<reqwest::Error> for GistError {
    fn from(err: reqwest::Error) -> Self {
        GistError::Network {
            message: err.to_string(),
            context: None,
            source: Some(err),
        }
    }
}

impl GistError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        GistError::Validation {
            message: message.into(),
        }
    }

    /// Attach the GitHub call this error came from.
    ///
    /// Timeouts and rate limits are folded into [`GistError::Network`] so the
    /// context survives; non-upstream variants are returned unchanged.
    pub fn with_context(self, ctx: FetchContext) -> Self {
        match self {
            err @ (GistError::Timeout(_) | GistError::RateLimited { .. }) => GistError::Network {
                message: err.to_string(),
                context: Some(ctx),
                source: None,
            },
            GistError::Network {
                message, source, ..
            } => GistError::Network {
                message,
                context: Some(ctx),
                source,
            },
            GistError::GitHubApi {
                message,
                status_code,
                ..
            } => GistError::GitHubApi {
                message,
                status_code,
                context: Some(ctx),
            },
            other => other,
        }
    }

    /// HTTP status code the API should answer with for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            GistError::Validation { .. } | GistError::InvalidPattern { .. } => 400,
            _ => 500,
        }
    }

    /// Message shown to API clients.
    pub fn client_message(&self) -> String {
        match self {
            GistError::Validation { message } => message.clone(),
            GistError::InvalidPattern { .. } => "Invalid regular expression pattern".to_string(),
            GistError::Network {
                context: Some(ctx), ..
            }
            | GistError::GitHubApi {
                context: Some(ctx), ..
            } => match ctx {
                FetchContext::GistList => format!("Error fetching gists: {}", self),
                FetchContext::Gist => format!("Error fetching gist files: {}", self),
                FetchContext::File(name) => format!("Error fetching file {}: {}", name, self),
            },
            other => other.to_string(),
        }
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            GistError::Network { .. } | GistError::Timeout(_) | GistError::RateLimited { .. } => {
                true
            }
            GistError::GitHubApi {
                status_code: Some(code),
                ..
            } => matches!(code, 408 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}
