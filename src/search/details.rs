//! The selected book and the lifecycle of its detail request.

use std::future::Future;
use std::sync::Arc;

use crate::models::{work_id_from_key, BookDetail, BookSummary};
use crate::search::{Ticket, TicketCounter};
use crate::sources::{Source, SourceError};

/// Errors from a one-shot detail fetch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetailError {
    #[error("book key has no work identifier")]
    NoIdentifier,

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// What the detail view currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DetailState {
    /// Nothing selected
    #[default]
    Idle,
    Loading {
        work_id: String,
    },
    Loaded(BookDetail),
    /// The selected book has no usable work id; no request was made
    Unavailable,
    Failed(String),
}

impl DetailState {
    pub fn is_loading(&self) -> bool {
        matches!(self, DetailState::Loading { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub ticket: Ticket,
    pub work_id: String,
}

#[derive(Debug, Clone)]
pub struct DetailCompletion {
    pub ticket: Ticket,
    pub work_id: String,
    pub outcome: Result<BookDetail, SourceError>,
}

/// Owns the selection and its [`DetailState`].
///
/// Selecting a book or closing the view supersedes any request in flight, so
/// a late response can never land on the wrong book.
#[derive(Debug)]
pub struct DetailFetcher {
    source: Arc<dyn Source>,
    selected: Option<BookSummary>,
    state: DetailState,
    tickets: TicketCounter,
    active: Option<Ticket>,
}

impl DetailFetcher {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self {
            source,
            selected: None,
            state: DetailState::Idle,
            tickets: TicketCounter::default(),
            active: None,
        }
    }

    /// Fetch details for a book key such as `/works/OL82563W` or a bare id.
    pub async fn fetch_details(&self, book_key: &str) -> Result<BookDetail, DetailError> {
        let work_id = work_id_from_key(book_key).ok_or(DetailError::NoIdentifier)?;
        Ok(self.source.work_details(work_id).await?)
    }

    pub fn selected(&self) -> Option<&BookSummary> {
        self.selected.as_ref()
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    /// Select `book` and request its details.
    ///
    /// Returns `None` when the book key yields no work id; the state is then
    /// [`DetailState::Unavailable`].
    pub fn select(&mut self, book: BookSummary) -> Option<DetailRequest> {
        let ticket = self.tickets.next();
        let work_id = book.work_id().map(str::to_string);
        self.selected = Some(book);

        match work_id {
            Some(work_id) => {
                self.active = Some(ticket);
                self.state = DetailState::Loading {
                    work_id: work_id.clone(),
                };
                Some(DetailRequest { ticket, work_id })
            }
            None => {
                self.active = None;
                self.state = DetailState::Unavailable;
                None
            }
        }
    }

    /// Close the detail view and forget the selection.
    pub fn close(&mut self) {
        self.selected = None;
        self.active = None;
        self.state = DetailState::Idle;
    }

    /// Future performing `request`; it owns everything it needs and can be spawned.
    pub fn execute(
        &self,
        request: DetailRequest,
    ) -> impl Future<Output = DetailCompletion> + Send + 'static {
        let source = Arc::clone(&self.source);
        async move {
            let outcome = source.work_details(&request.work_id).await;
            DetailCompletion {
                ticket: request.ticket,
                work_id: request.work_id,
                outcome,
            }
        }
    }

    /// Apply a finished request. Returns `false` if it was stale and discarded.
    pub fn complete(&mut self, completion: DetailCompletion) -> bool {
        if self.active != Some(completion.ticket) {
            tracing::debug!(
                work_id = %completion.work_id,
                "Discarding detail response for a closed or replaced selection"
            );
            return false;
        }

        self.active = None;
        self.state = match completion.outcome {
            Ok(detail) => DetailState::Loaded(detail),
            Err(error) => {
                tracing::warn!(work_id = %completion.work_id, error = %error, "Detail fetch failed");
                DetailState::Failed(error.to_string())
            }
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::mock::{make_book, MockSource};
    use std::time::Duration;

    fn detail(description: &str) -> BookDetail {
        BookDetail {
            description: Some(description.to_string()),
            subjects: vec!["Fiction".to_string()],
            ..BookDetail::default()
        }
    }

    fn setup() -> (Arc<MockSource>, DetailFetcher) {
        let mock = Arc::new(MockSource::new());
        let fetcher = DetailFetcher::new(mock.clone());
        (mock, fetcher)
    }

    #[tokio::test]
    async fn test_fetch_details_uses_last_key_segment() {
        let (mock, fetcher) = setup();
        mock.set_detail_response("OL45804W", detail("Spice"));

        let result = fetcher.fetch_details("/works/OL45804W").await.unwrap();
        assert_eq!(result.description.as_deref(), Some("Spice"));
        assert_eq!(mock.detail_calls(), vec!["OL45804W".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_details_without_identifier() {
        let (mock, fetcher) = setup();

        let err = fetcher.fetch_details("/works/").await.unwrap_err();
        assert_eq!(err, DetailError::NoIdentifier);
        assert!(mock.detail_calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_details_propagates_source_error() {
        let (_mock, fetcher) = setup();

        let err = fetcher.fetch_details("OL1W").await.unwrap_err();
        assert!(matches!(err, DetailError::Source(SourceError::NotFound(_))));
    }

    #[test]
    fn test_select_without_identifier_is_unavailable() {
        let (mock, mut fetcher) = setup();

        let request = fetcher.select(BookSummary::new("", "Keyless"));
        assert!(request.is_none());
        assert_eq!(fetcher.state(), &DetailState::Unavailable);
        assert!(fetcher.is_open());
        assert!(mock.detail_calls().is_empty());
    }

    #[test]
    fn test_select_loads_then_applies() {
        let (mock, mut fetcher) = setup();
        mock.set_detail_response("OL1W", detail("First"));

        let request = fetcher.select(make_book("OL1W", "First", None)).unwrap();
        assert_eq!(
            fetcher.state(),
            &DetailState::Loading {
                work_id: "OL1W".to_string()
            }
        );

        let completion = tokio_test::block_on(fetcher.execute(request));
        assert!(fetcher.complete(completion));
        assert_eq!(fetcher.state(), &DetailState::Loaded(detail("First")));
    }

    #[test]
    fn test_failure_is_reported_in_state() {
        let (mock, mut fetcher) = setup();
        mock.set_detail_error("OL1W", SourceError::Network("offline".to_string()));

        let request = fetcher.select(make_book("OL1W", "First", None)).unwrap();
        let completion = tokio_test::block_on(fetcher.execute(request));
        fetcher.complete(completion);

        assert!(matches!(fetcher.state(), DetailState::Failed(msg) if msg.contains("offline")));
    }

    #[test]
    fn test_late_response_after_close_is_discarded() {
        let (mock, mut fetcher) = setup();
        mock.set_detail_response("OL1W", detail("First"));

        let request = fetcher.select(make_book("OL1W", "First", None)).unwrap();
        fetcher.close();

        let completion = tokio_test::block_on(fetcher.execute(request));
        assert!(!fetcher.complete(completion));
        assert_eq!(fetcher.state(), &DetailState::Idle);
        assert!(fetcher.selected().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_after_reselect_is_discarded() {
        let (mock, mut fetcher) = setup();
        mock.set_detail_response("OL1W", detail("First"));
        mock.set_detail_response("OL2W", detail("Second"));
        mock.set_delay("OL1W", Duration::from_millis(300));

        let first = fetcher.select(make_book("OL1W", "First", None)).unwrap();
        let first = tokio::spawn(fetcher.execute(first));
        let second = fetcher.select(make_book("OL2W", "Second", None)).unwrap();
        let second = fetcher.execute(second).await;

        assert!(fetcher.complete(second));
        assert!(!fetcher.complete(first.await.unwrap()));
        assert_eq!(fetcher.state(), &DetailState::Loaded(detail("Second")));
        assert_eq!(fetcher.selected().map(|b| b.title.as_str()), Some("Second"));
    }
}
