//! Committed query, current page and the raw result set.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::models::SearchResult;
use crate::search::{Pagination, Ticket, TicketCounter};
use crate::sources::{Source, SourceError};

const ERROR_CHANNEL_CAPACITY: usize = 16;

/// A fetch the orchestrator wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub ticket: Ticket,
    pub query: String,
    pub page: u32,
}

/// The outcome of a [`SearchRequest`], tagged with its ticket.
#[derive(Debug, Clone)]
pub struct SearchCompletion {
    pub ticket: Ticket,
    pub query: String,
    pub page: u32,
    pub outcome: Result<SearchResult, SourceError>,
}

/// A failed search as published on the error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFailure {
    pub query: String,
    pub page: u32,
    pub error: SourceError,
}

/// Drives searches against a [`Source`].
///
/// State changes go through [`commit_query`](Self::commit_query),
/// [`go_to_page`](Self::go_to_page) and [`clear`](Self::clear), each of which
/// supersedes any request still in flight. The returned [`SearchRequest`] is
/// performed with [`execute`](Self::execute) and handed back through
/// [`complete`](Self::complete), which ignores anything but the latest ticket.
///
/// Failures never surface as errors: the result degrades to empty and the
/// failure is published to every [`subscribe_errors`](Self::subscribe_errors)
/// receiver.
#[derive(Debug)]
pub struct SearchOrchestrator {
    source: Arc<dyn Source>,
    page_size: u32,
    query: String,
    page: u32,
    result: SearchResult,
    // Query whose response produced `result`
    result_query: String,
    tickets: TicketCounter,
    latest: Option<Ticket>,
    loading: bool,
    last_error: Option<SearchFailure>,
    errors: broadcast::Sender<SearchFailure>,
}

impl SearchOrchestrator {
    pub fn new(source: Arc<dyn Source>, page_size: u32) -> Self {
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            source,
            page_size: page_size.max(1),
            query: String::new(),
            page: 1,
            result: SearchResult::empty(),
            result_query: String::new(),
            tickets: TicketCounter::default(),
            latest: None,
            loading: false,
            last_error: None,
            errors,
        }
    }

    /// Receive every search failure from now on.
    pub fn subscribe_errors(&self) -> broadcast::Receiver<SearchFailure> {
        self.errors.subscribe()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Raw result of the latest applied search.
    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The failure behind the current (empty) result, if any.
    pub fn last_error(&self) -> Option<&SearchFailure> {
        self.last_error.as_ref()
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size, self.result.total_count)
    }

    /// Commit a new query and request its results.
    ///
    /// The page resets to 1 whenever the query differs from the committed one.
    /// Returns `None` for a blank query: the result is emptied on the spot.
    pub fn commit_query(&mut self, query: &str) -> Option<SearchRequest> {
        if query != self.query {
            self.query = query.to_string();
            self.page = 1;
        }
        self.dispatch()
    }

    /// Move to `page` and request it.
    ///
    /// Out-of-range pages and the current page are ignored, and so is every
    /// move until the committed query's first response has arrived.
    pub fn go_to_page(&mut self, page: u32) -> Option<SearchRequest> {
        if self.result_query != self.query {
            return None;
        }
        let target = self.pagination().go_to(page)?;
        self.page = target;
        self.dispatch()
    }

    pub fn next_page(&mut self) -> Option<SearchRequest> {
        let target = self.pagination().next()?;
        self.go_to_page(target)
    }

    pub fn prev_page(&mut self) -> Option<SearchRequest> {
        let target = self.pagination().prev()?;
        self.go_to_page(target)
    }

    /// Drop the query and its results, superseding any request in flight.
    pub fn clear(&mut self) {
        self.query.clear();
        self.page = 1;
        self.dispatch();
    }

    fn dispatch(&mut self) -> Option<SearchRequest> {
        let ticket = self.tickets.next();
        self.latest = Some(ticket);

        if self.query.trim().is_empty() {
            self.result = SearchResult::empty();
            self.result_query = self.query.clone();
            self.loading = false;
            self.last_error = None;
            return None;
        }

        self.loading = true;
        Some(SearchRequest {
            ticket,
            query: self.query.clone(),
            page: self.page,
        })
    }

    /// Future performing `request`; it owns everything it needs and can be spawned.
    pub fn execute(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = SearchCompletion> + Send + 'static {
        let source = Arc::clone(&self.source);
        let limit = self.page_size;
        async move {
            let outcome = source.search(&request.query, request.page, limit).await;
            SearchCompletion {
                ticket: request.ticket,
                query: request.query,
                page: request.page,
                outcome,
            }
        }
    }

    /// Apply a finished request. Returns `false` if it was stale and discarded.
    pub fn complete(&mut self, completion: SearchCompletion) -> bool {
        if self.latest != Some(completion.ticket) {
            tracing::debug!(
                query = %completion.query,
                page = completion.page,
                ticket = completion.ticket.get(),
                "Discarding stale search response"
            );
            return false;
        }

        self.loading = false;
        self.result_query = completion.query.clone();
        match completion.outcome {
            Ok(result) => {
                tracing::debug!(
                    query = %completion.query,
                    page = completion.page,
                    total = result.total_count,
                    "Search results applied"
                );
                self.result = result;
                self.last_error = None;
            }
            Err(error) => {
                tracing::warn!(
                    source = self.source.id(),
                    query = %completion.query,
                    page = completion.page,
                    error = %error,
                    "Search failed"
                );
                self.result = SearchResult::empty();
                let failure = SearchFailure {
                    query: completion.query,
                    page: completion.page,
                    error,
                };
                // No subscribers is fine
                let _ = self.errors.send(failure.clone());
                self.last_error = Some(failure);
            }
        }
        true
    }

    /// Search `query` at `page` and wait for the outcome.
    ///
    /// A blank query yields an empty result without touching the source; a
    /// failed request yields an empty result and is published on the error
    /// channel.
    pub async fn search(&mut self, query: &str, page: u32) -> &SearchResult {
        self.query = query.to_string();
        self.page = page.max(1);
        if let Some(request) = self.dispatch() {
            let completion = self.execute(request).await;
            self.complete(completion);
        }
        &self.result
    }
}
