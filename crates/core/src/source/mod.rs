//! Remote catalog source integration for MangaDex.
//!
//! This module provides the client for the public MangaDex listing and
//! author endpoints, plus the trait the import pipeline drives so tests
//! can substitute a scripted source.

mod mangadex;
mod types;

pub use mangadex::{MangadexClient, MangadexConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the remote catalog.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Trait for remote catalog sources.
///
/// Implemented by MangadexClient in production and by the scripted mock
/// in tests.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of records matching the query.
    async fn fetch_page(&self, query: &PageQuery) -> Result<CatalogPage, SourceError>;

    /// Resolve author ids to names. Callers must keep `ids` within the
    /// remote's per-request limit.
    async fn fetch_authors(&self, ids: &[String]) -> Result<Vec<AuthorEntry>, SourceError>;

    /// Total number of records the remote reports for the filter.
    async fn total_available(&self, filter: &PassFilter) -> Result<u64, SourceError>;
}
