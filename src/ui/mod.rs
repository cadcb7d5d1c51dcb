//! Terminal rendering for search results, pagination and book details.
//!
//! Everything renders to a `String`; callers decide where it goes. Colour is
//! opt-in per [`Renderer`] so piped output stays clean.

mod browser;

pub use browser::{parse_command, run_browser, BrowserCommand, HELP};

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::models::{cover_url, language_label, BookSummary, CoverSize, KNOWN_LANGUAGES};
use crate::search::{DetailState, PageWindow, SearchFailure};
use crate::utils::{format_number, terminal_width, truncate_at_word, DEFAULT_WIDTH};

/// Subjects listed in the detail view
pub const MAX_SUBJECTS: usize = 20;

/// Status icons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Loading,
    Search,
}

pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Loading => "◐",
        Status::Search => "🔍",
    }
}

/// Machine-readable form of one rendered results page.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPageView<'a> {
    pub query: &'a str,
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub items: &'a [BookSummary],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Renders views with a fixed colour choice, width and cover host.
#[derive(Debug, Clone)]
pub struct Renderer {
    covers_url: String,
    color: bool,
    /// Wrap tables to this width; unconstrained when `None`
    width: Option<usize>,
}

impl Renderer {
    /// Renderer sized to the current terminal.
    pub fn new(covers_url: impl Into<String>, color: bool) -> Self {
        Self {
            covers_url: covers_url.into(),
            color,
            width: Some(terminal_width()),
        }
    }

    /// Colourless renderer that never wraps, for pipes and logs.
    pub fn plain(covers_url: impl Into<String>) -> Self {
        Self {
            covers_url: covers_url.into(),
            color: false,
            width: None,
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn accent(&self, text: &str) -> String {
        if self.color {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// One status line, e.g. `✗ Search failed`.
    pub fn status(&self, status: Status, message: &str) -> String {
        let icon = status_icon(status);
        if !self.color {
            return format!("{} {}", icon, message);
        }
        let icon = match status {
            Status::Success => icon.green().bold().to_string(),
            Status::Error => icon.red().bold().to_string(),
            Status::Warning => icon.yellow().bold().to_string(),
            Status::Info => icon.cyan().bold().to_string(),
            Status::Loading => icon.cyan().to_string(),
            Status::Search => icon.yellow().to_string(),
        };
        format!("{} {}", icon, message)
    }

    /// Error line for a search that degraded to an empty result.
    pub fn search_failure(&self, failure: &SearchFailure) -> String {
        self.status(Status::Error, &format!("Search failed: {}", failure.error))
    }

    /// Result count header, e.g. `About 1,234 results`.
    pub fn summary(&self, total_count: u64) -> String {
        format!("About {} results", self.bold(&format_number(total_count)))
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        if let Some(width) = self.width {
            table
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_width(u16::try_from(width).unwrap_or(u16::MAX));
        }
        if !self.color {
            table.force_no_tty();
        }
        table
    }

    /// Card grid for the visible books, or the empty-state message.
    pub fn book_grid(&self, books: &[BookSummary]) -> String {
        if books.is_empty() {
            return format!(
                "{}\n{}",
                self.bold("No results found"),
                self.dim("Try a different search or broaden the filters.")
            );
        }

        let mut table = self.table();
        table.set_header(vec!["#", "Title", "Authors", "Year", "Lang", "Cover"]);

        let title_width = (self.width.unwrap_or(DEFAULT_WIDTH) / 3).max(20);
        for (index, book) in books.iter().enumerate() {
            let authors = book.author_line();
            let year = book
                .first_publish_year
                .map(|y| y.to_string())
                .unwrap_or_default();
            let cover = book
                .cover_image_id
                .map(|id| cover_url(&self.covers_url, id, CoverSize::Medium))
                .unwrap_or_else(|| "no cover".to_string());

            table.add_row(vec![
                Cell::new(index + 1),
                Cell::new(truncate_at_word(&book.title, title_width)).add_attribute(Attribute::Bold),
                Cell::new(if authors.is_empty() {
                    "Unknown author".to_string()
                } else {
                    authors
                }),
                Cell::new(year),
                Cell::new(book.primary_language().unwrap_or("")),
                Cell::new(cover),
            ]);
        }
        table.to_string()
    }

    /// Pagination bar: `‹ Prev  1 2 [3] 4 5  Next ›  Page 3 of 12`.
    pub fn page_bar(&self, window: &PageWindow) -> String {
        let prev = if window.can_go_prev {
            "‹ Prev".to_string()
        } else {
            self.dim("‹ Prev")
        };
        let next = if window.can_go_next {
            "Next ›".to_string()
        } else {
            self.dim("Next ›")
        };
        let pages: Vec<String> = window
            .pages
            .iter()
            .map(|&page| {
                if page == window.current_page {
                    self.accent(&format!("[{}]", page))
                } else {
                    page.to_string()
                }
            })
            .collect();

        format!(
            "{}  {}  {}   Page {} of {}",
            prev,
            pages.join(" "),
            next,
            window.current_page,
            window.total_pages
        )
    }

    /// Header, grid and pagination bar for one page of results.
    ///
    /// The bar follows the fetched total, so it stays when filters hide
    /// every book on the page.
    pub fn results_page(&self, books: &[BookSummary], total_count: u64, window: &PageWindow) -> String {
        let mut out = self.summary(total_count);
        out.push('\n');
        out.push_str(&self.book_grid(books));
        if total_count > 0 {
            out.push('\n');
            out.push_str(&self.page_bar(window));
        }
        out
    }

    /// The detail view for the selected book.
    pub fn detail(&self, book: Option<&BookSummary>, state: &DetailState) -> String {
        let mut lines = Vec::new();

        if let Some(book) = book {
            lines.push(self.accent(&book.title));
            let authors = book.author_line();
            if !authors.is_empty() {
                lines.push(authors);
            }
            if let Some(id) = book.cover_image_id {
                lines.push(format!(
                    "Cover: {}",
                    cover_url(&self.covers_url, id, CoverSize::Large)
                ));
            }
            lines.push(String::new());
        }

        match state {
            DetailState::Idle => lines.push(self.dim("No book selected.")),
            DetailState::Loading { .. } => lines.push(self.status(Status::Loading, "Loading details...")),
            DetailState::Unavailable => lines.push("Details unavailable for this book.".to_string()),
            DetailState::Failed(reason) => {
                lines.push(self.status(Status::Error, &format!("Could not load details: {}", reason)))
            }
            DetailState::Loaded(detail) => {
                lines.push(
                    detail
                        .description
                        .clone()
                        .unwrap_or_else(|| "No description available.".to_string()),
                );

                if !detail.subjects.is_empty() {
                    lines.push(String::new());
                    lines.push(self.bold("Subjects"));
                    let subjects: Vec<&str> = detail
                        .subjects
                        .iter()
                        .take(MAX_SUBJECTS)
                        .map(String::as_str)
                        .collect();
                    lines.push(subjects.join(" · "));
                }

                let mut facts = Vec::new();
                if let Some(date) = &detail.first_publish_date {
                    facts.push(format!("First published: {}", date));
                }
                if let Some(count) = detail.edition_count {
                    facts.push(format!("Editions: {}", count));
                }
                if let Some(pages) = detail.number_of_pages {
                    facts.push(format!("Pages: {}", pages));
                }
                if !facts.is_empty() {
                    lines.push(String::new());
                    lines.extend(facts);
                }
            }
        }

        lines.join("\n")
    }

    /// Table of the language filter choices.
    pub fn languages(&self) -> String {
        let mut table = self.table();
        table.set_header(vec!["Code", "Language"]);
        for (code, label) in KNOWN_LANGUAGES {
            table.add_row(vec![Cell::new(code), Cell::new(label)]);
        }
        table.to_string()
    }

    /// One-line description of the active filters.
    pub fn filters(&self, criteria: &crate::models::FilterCriteria) -> String {
        let language = criteria
            .active_language()
            .map(|code| language_label(code).unwrap_or(code).to_string())
            .unwrap_or_else(|| "any".to_string());
        let years = match (criteria.min_year, criteria.max_year) {
            (None, None) => "any".to_string(),
            (Some(min), None) => format!("{}+", min),
            (None, Some(max)) => format!("up to {}", max),
            (Some(min), Some(max)) => format!("{}-{}", min, max),
        };
        self.dim(&format!(
            "Language: {} | Years: {} | Sort: {}",
            language, years, criteria.sort_order
        ))
    }
}
