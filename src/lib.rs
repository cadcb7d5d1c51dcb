//! # Bookfinder
//!
//! A book search client for the Open Library catalogue.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (BookSummary, BookDetail, FilterCriteria, etc.)
//! - [`sources`]: The catalogue [`Source`] trait, the Open Library adapter and a mock
//! - [`search`]: Search orchestration, filtering, pagination and book details
//! - [`ui`]: Terminal rendering and the interactive browser
//! - [`utils`]: HTTP client, input debouncing and text helpers
//! - [`config`]: Configuration management

pub mod config;
pub mod models;
pub mod search;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{BookDetail, BookSummary, FilterCriteria, SearchResult, SortOrder};
pub use search::{BrowseSession, QueryEvent};
pub use sources::{OpenLibrarySource, Source, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
