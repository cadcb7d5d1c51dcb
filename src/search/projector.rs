//! Client-side filtering and sorting of a fetched page.

use std::cmp::Reverse;

use crate::models::{BookSummary, FilterCriteria, SortOrder};

/// Whether `book` passes the language and year filters of `criteria`.
///
/// A missing publish year counts as year 0.
pub fn matches(book: &BookSummary, criteria: &FilterCriteria) -> bool {
    if let Some(language) = criteria.active_language() {
        if !book.languages.iter().any(|code| code == language) {
            return false;
        }
    }

    let year = book.year_or_zero();
    criteria.min_year.is_none_or(|min| year >= min)
        && criteria.max_year.is_none_or(|max| year <= max)
}

/// Derive the displayed list from a raw page.
///
/// Filters first, then sorts. `Relevance` keeps API order; the year orders use
/// a stable sort so books sharing a year keep their relative order. The input
/// is never modified.
pub fn project(items: &[BookSummary], criteria: &FilterCriteria) -> Vec<BookSummary> {
    let mut visible: Vec<BookSummary> = items
        .iter()
        .filter(|book| matches(book, criteria))
        .cloned()
        .collect();

    match criteria.sort_order {
        SortOrder::Relevance => {}
        SortOrder::Newest => visible.sort_by_key(|book| Reverse(book.year_or_zero())),
        SortOrder::Oldest => visible.sort_by_key(BookSummary::year_or_zero),
    }

    visible
}
