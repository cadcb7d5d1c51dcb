//! Catalogue sources with a trait-based seam.
//!
//! This module defines the [`Source`] trait that the search and detail flows
//! talk to. [`OpenLibrarySource`] implements it over HTTP; [`MockSource`]
//! implements it in memory for tests and offline demos.
//!
//! # Runtime Configuration
//!
//! The Open Library host is taken from [`crate::config::ApiConfig`]:
//!
//! - `BOOKFINDER_BASE_URL` / `OPENLIBRARY_BASE` - API host (default `https://openlibrary.org`)
//! - `BOOKFINDER_API__TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//!
//! ```bash
//! # Point at a local mirror
//! export BOOKFINDER_BASE_URL="http://localhost:8080"
//! ```

mod openlibrary;

pub mod mock;

pub use mock::MockSource;
pub use openlibrary::OpenLibrarySource;

use crate::models::{BookDetail, SearchResult};
use async_trait::async_trait;

/// The Source trait defines the interface the search session uses to reach a
/// catalogue.
///
/// Implementations perform exactly one request per call and never retry;
/// callers decide what a failure means for the view.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "openlibrary"), used in logs
    fn id(&self) -> &str;

    /// Fetch one page of hits for `query`.
    ///
    /// `page` is 1-based and `limit` is the page size.
    async fn search(&self, query: &str, page: u32, limit: u32)
        -> Result<SearchResult, SourceError>;

    /// Fetch extended details for a work identifier (e.g. `OL82563W`)
    async fn work_details(&self, work_id: &str) -> Result<BookDetail, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The API answered with a non-success status
    #[error("API error: status {status}")]
    Api { status: u16 },

    /// The payload did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The work does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return SourceError::Parse(err.to_string());
        }
        match err.status() {
            Some(status) => SourceError::Api {
                status: status.as_u16(),
            },
            None => SourceError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}
