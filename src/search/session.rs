//! Single owner of the browsing state and its event loop.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::config::SearchConfig;
use crate::models::{BookSummary, FilterCriteria, SearchResult};
use crate::search::{
    project, DetailCompletion, DetailFetcher, DetailRequest, DetailState, PageWindow,
    SearchCompletion, SearchFailure, SearchOrchestrator, SearchRequest,
};
use crate::sources::Source;
use crate::utils::Debouncer;

/// User input against the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    /// Text changed; committed once typing pauses
    Changed(String),
    /// Commit immediately, discarding anything still being debounced
    Submit(String),
    /// Empty the box and the results
    Clear,
}

/// A finished request travelling back to the session.
#[derive(Debug)]
pub enum Completion {
    Search(SearchCompletion),
    Detail(DetailCompletion),
}

/// What [`BrowseSession::next_update`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// A debounced query was committed. `dispatched` is false for a blank
    /// query, which empties the results without a request.
    QueryCommitted { query: String, dispatched: bool },
    /// Debounced input that was superseded or matched the committed query
    InputIgnored,
    ResultsApplied,
    DetailsApplied,
    /// A response for a superseded request was dropped
    Stale,
}

/// Ties the orchestrator, the detail fetcher, the filters and the input
/// debouncer together.
///
/// All state lives here and is only mutated from the task driving
/// [`next_update`](Self::next_update). Fetches run on spawned tasks and report
/// back through a channel, so the session never blocks on the network.
#[derive(Debug)]
pub struct BrowseSession {
    orchestrator: SearchOrchestrator,
    details: DetailFetcher,
    filters: FilterCriteria,
    max_page_buttons: u32,
    debouncer: Debouncer<String>,
    committed: mpsc::UnboundedReceiver<String>,
    pending_input: Option<String>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl BrowseSession {
    /// Create a session. Must be called within a tokio runtime.
    pub fn new(source: Arc<dyn Source>, config: &SearchConfig) -> Self {
        let (debouncer, committed) = Debouncer::spawn(config.debounce());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            orchestrator: SearchOrchestrator::new(Arc::clone(&source), config.page_size),
            details: DetailFetcher::new(source),
            filters: FilterCriteria::default(),
            max_page_buttons: config.max_page_buttons,
            debouncer,
            committed,
            pending_input: None,
            completions_tx,
            completions_rx,
        }
    }

    // ----- read projections -----

    pub fn query(&self) -> &str {
        self.orchestrator.query()
    }

    pub fn page(&self) -> u32 {
        self.orchestrator.page()
    }

    /// Raw page as returned by the source
    pub fn result(&self) -> &SearchResult {
        self.orchestrator.result()
    }

    /// The raw page after filtering and sorting
    pub fn visible_books(&self) -> Vec<BookSummary> {
        project(&self.orchestrator.result().items, &self.filters)
    }

    pub fn page_window(&self) -> PageWindow {
        self.orchestrator
            .pagination()
            .window(self.max_page_buttons)
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn detail_state(&self) -> &DetailState {
        self.details.state()
    }

    pub fn selected_book(&self) -> Option<&BookSummary> {
        self.details.selected()
    }

    pub fn is_loading(&self) -> bool {
        self.orchestrator.is_loading()
    }

    pub fn last_error(&self) -> Option<&SearchFailure> {
        self.orchestrator.last_error()
    }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<SearchFailure> {
        self.orchestrator.subscribe_errors()
    }

    /// No input waiting on the debouncer and no request outstanding.
    pub fn is_idle(&self) -> bool {
        self.pending_input.is_none()
            && !self.orchestrator.is_loading()
            && !self.details.state().is_loading()
    }

    // ----- input -----

    pub fn handle_query(&mut self, event: QueryEvent) {
        match event {
            QueryEvent::Changed(text) => {
                self.pending_input = Some(text.clone());
                self.debouncer.push(text);
            }
            QueryEvent::Submit(text) => {
                self.discard_pending_input();
                let request = self.orchestrator.commit_query(&text);
                self.spawn_search(request);
            }
            QueryEvent::Clear => {
                self.discard_pending_input();
                self.orchestrator.clear();
                self.details.close();
            }
        }
    }

    /// Commit whatever is still being debounced right away.
    pub fn flush_input(&mut self) {
        self.debouncer.cancel();
        if let Some(query) = self.pending_input.take() {
            if query != self.orchestrator.query() {
                let request = self.orchestrator.commit_query(&query);
                self.spawn_search(request);
            }
        }
    }

    fn discard_pending_input(&mut self) {
        self.debouncer.cancel();
        self.pending_input = None;
    }

    /// Replace the filters. Filtering is local; nothing is refetched.
    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
    }

    pub fn go_to_page(&mut self, page: u32) -> bool {
        let request = self.orchestrator.go_to_page(page);
        self.spawn_search(request)
    }

    pub fn next_page(&mut self) -> bool {
        let request = self.orchestrator.next_page();
        self.spawn_search(request)
    }

    pub fn prev_page(&mut self) -> bool {
        let request = self.orchestrator.prev_page();
        self.spawn_search(request)
    }

    /// Open the detail view for the `index`-th visible book (0-based).
    pub fn select(&mut self, index: usize) -> bool {
        match self.visible_books().into_iter().nth(index) {
            Some(book) => {
                self.select_book(book);
                true
            }
            None => false,
        }
    }

    pub fn select_book(&mut self, book: BookSummary) {
        let request = self.details.select(book);
        self.spawn_details(request);
    }

    pub fn close_details(&mut self) {
        self.details.close();
    }

    // ----- event loop -----

    /// Wait for the next committed query or finished request and apply it.
    ///
    /// Returns `None` only if every event source has shut down. Cancel-safe.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        tokio::select! {
            Some(query) = self.committed.recv() => Some(self.apply_committed(query)),
            Some(completion) = self.completions_rx.recv() => Some(self.apply(completion)),
            else => None,
        }
    }

    /// Process updates until the session is idle.
    pub async fn settle(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while !self.is_idle() {
            match self.next_update().await {
                Some(update) => updates.push(update),
                None => break,
            }
        }
        updates
    }

    /// Apply a finished request.
    pub fn apply(&mut self, completion: Completion) -> SessionUpdate {
        let (applied, update) = match completion {
            Completion::Search(c) => (self.orchestrator.complete(c), SessionUpdate::ResultsApplied),
            Completion::Detail(c) => (self.details.complete(c), SessionUpdate::DetailsApplied),
        };
        if applied {
            update
        } else {
            SessionUpdate::Stale
        }
    }

    fn apply_committed(&mut self, query: String) -> SessionUpdate {
        if self.pending_input.as_deref() != Some(query.as_str()) {
            return SessionUpdate::InputIgnored;
        }
        self.pending_input = None;

        if query == self.orchestrator.query() {
            return SessionUpdate::InputIgnored;
        }

        tracing::debug!(query = %query, "Query committed");
        let request = self.orchestrator.commit_query(&query);
        let dispatched = self.spawn_search(request);
        SessionUpdate::QueryCommitted { query, dispatched }
    }

    fn spawn_search(&self, request: Option<SearchRequest>) -> bool {
        let Some(request) = request else {
            return false;
        };
        let fetch = self.orchestrator.execute(request);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Completion::Search(fetch.await));
        });
        true
    }

    fn spawn_details(&self, request: Option<DetailRequest>) -> bool {
        let Some(request) = request else {
            return false;
        };
        let fetch = self.details.execute(request);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Completion::Detail(fetch.await));
        });
        true
    }
}
