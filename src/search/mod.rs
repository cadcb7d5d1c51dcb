//! Search orchestration: the state machine between user input and the catalogue.
//!
//! - [`SearchOrchestrator`]: owns the committed query, current page and raw results
//! - [`project`]: pure filter/sort over the raw page
//! - [`DetailFetcher`]: owns the selected book and its detail state
//! - [`Pagination`] / [`compute_window`]: page arithmetic for the pagination bar
//! - [`BrowseSession`]: the single owner tying the above to a debouncer and a
//!   completion channel
//!
//! Every request is tagged with a [`Ticket`]. Completions carrying anything but
//! the most recent ticket of their kind are dropped, so a slow response can
//! never overwrite the result of a newer query or selection.

mod details;
mod orchestrator;
mod pagination;
mod projector;
mod session;

pub use details::{DetailCompletion, DetailError, DetailFetcher, DetailRequest, DetailState};
pub use orchestrator::{SearchCompletion, SearchFailure, SearchOrchestrator, SearchRequest};
pub use pagination::{compute_window, total_pages, PageWindow, Pagination};
pub use projector::{matches, project};
pub use session::{BrowseSession, Completion, QueryEvent, SessionUpdate};

/// Sequence number attached to a dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Raw sequence number
    pub fn get(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct TicketCounter(u64);

impl TicketCounter {
    fn next(&mut self) -> Ticket {
        self.0 += 1;
        Ticket(self.0)
    }
}
