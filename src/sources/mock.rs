//! In-memory source for tests and offline runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::models::{BookDetail, BookSummary, SearchResult};
use crate::sources::{Source, SourceError};

/// A search call as the mock received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub query: String,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Default)]
struct MockState {
    search_responses: HashMap<String, Result<SearchResult, SourceError>>,
    detail_responses: HashMap<String, Result<BookDetail, SourceError>>,
    delays: HashMap<String, Duration>,
    search_calls: Vec<SearchCall>,
    detail_calls: Vec<String>,
}

/// A mock source that returns predefined responses.
///
/// Responses are keyed by query (searches) or work id (details). Unknown keys
/// answer with an empty result and `NotFound` respectively. A delay can be
/// attached to any key to simulate slow requests; it uses the tokio clock, so
/// paused-time tests stay deterministic.
#[derive(Debug, Default)]
pub struct MockSource {
    state: Mutex<MockState>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the result returned for `query`.
    pub fn set_search_response(&self, query: impl Into<String>, result: SearchResult) {
        self.state().search_responses.insert(query.into(), Ok(result));
    }

    /// Make searches for `query` fail with `error`.
    pub fn set_search_error(&self, query: impl Into<String>, error: SourceError) {
        self.state().search_responses.insert(query.into(), Err(error));
    }

    /// Set the detail returned for `work_id`.
    pub fn set_detail_response(&self, work_id: impl Into<String>, detail: BookDetail) {
        self.state().detail_responses.insert(work_id.into(), Ok(detail));
    }

    /// Make detail fetches for `work_id` fail with `error`.
    pub fn set_detail_error(&self, work_id: impl Into<String>, error: SourceError) {
        self.state().detail_responses.insert(work_id.into(), Err(error));
    }

    /// Delay responses for a query or work id.
    pub fn set_delay(&self, key: impl Into<String>, delay: Duration) {
        self.state().delays.insert(key.into(), delay);
    }

    /// Search calls received so far, in order.
    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.state().search_calls.clone()
    }

    /// Work ids requested so far, in order.
    pub fn detail_calls(&self) -> Vec<String> {
        self.state().detail_calls.clone()
    }

    async fn pause_for(&self, key: &str) {
        let delay = self.state().delays.get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<SearchResult, SourceError> {
        self.state().search_calls.push(SearchCall {
            query: query.to_string(),
            page,
            limit,
        });
        self.pause_for(query).await;

        let response = self.state().search_responses.get(query).cloned();
        response.unwrap_or_else(|| Ok(SearchResult::empty()))
    }

    async fn work_details(&self, work_id: &str) -> Result<BookDetail, SourceError> {
        self.state().detail_calls.push(work_id.to_string());
        self.pause_for(work_id).await;

        let response = self.state().detail_responses.get(work_id).cloned();
        response.unwrap_or_else(|| Err(SourceError::NotFound(format!("work {}", work_id))))
    }
}

/// Helper function to create a book for testing.
pub fn make_book(work_id: &str, title: &str, year: Option<i32>) -> BookSummary {
    let book = BookSummary::new(format!("/works/{}", work_id), title);
    match year {
        Some(year) => book.year(year),
        None => book,
    }
}
