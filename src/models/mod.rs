//! Core data models for books and search operations.

mod book;
mod filter;

pub use book::{
    cover_url, work_id_from_key, BookDetail, BookSummary, CoverSize, Description, SearchResult,
};
pub use filter::{language_label, FilterCriteria, SortOrder, KNOWN_LANGUAGES};
