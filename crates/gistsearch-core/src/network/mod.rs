//! Network layer for talking to GitHub.
//!
//! This module provides:
//! - An authenticated HTTP client with rate limit tracking
//! - Retry logic with exponential backoff and jitter
//! - `Link` header pagination parsing
//! - The GitHub gist client

mod client;
mod github;
pub mod link;
mod retry;

pub use client::{HttpClient, RateLimitState};
pub use github::{GitHubGistClient, RawFileCache};
pub use retry::{retry_async, RetryConfig};
