//! Book models shared by the search and detail flows.

use serde::{Deserialize, Serialize};

/// A single search hit as shown on a result card.
///
/// Summaries are immutable once received and owned by the [`SearchResult`]
/// they arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    /// Stable catalogue key (e.g. `/works/OL82563W`)
    pub id: String,

    /// Book title
    pub title: String,

    /// Author names in catalogue order
    pub author_names: Vec<String>,

    /// Year of first publication, when known
    pub first_publish_year: Option<i32>,

    /// Numeric cover image identifier, when the work has a cover
    pub cover_image_id: Option<i64>,

    /// Language codes (e.g. "eng", "fre")
    pub languages: Vec<String>,
}

impl BookSummary {
    /// Create a summary with only the required fields set
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author_names: Vec::new(),
            first_publish_year: None,
            cover_image_id: None,
            languages: Vec::new(),
        }
    }

    /// Set author names
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.author_names = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Set the first publish year
    pub fn year(mut self, year: i32) -> Self {
        self.first_publish_year = Some(year);
        self
    }

    /// Set the cover image id
    pub fn cover(mut self, cover_id: i64) -> Self {
        self.cover_image_id = Some(cover_id);
        self
    }

    /// Set language codes
    pub fn languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    /// Publish year used for filtering and sorting; unknown years count as 0.
    pub fn year_or_zero(&self) -> i32 {
        self.first_publish_year.unwrap_or(0)
    }

    /// The first two authors joined for card display.
    pub fn author_line(&self) -> String {
        self.author_names
            .iter()
            .take(2)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// First listed language, if any
    pub fn primary_language(&self) -> Option<&str> {
        self.languages.first().map(String::as_str)
    }

    /// Derive the work identifier from the stable key.
    ///
    /// See [`work_id_from_key`].
    pub fn work_id(&self) -> Option<&str> {
        work_id_from_key(&self.id)
    }
}

/// Extract the work identifier (the last path segment, if non-empty) from a key.
///
/// ```
/// use bookfinder::models::work_id_from_key;
///
/// assert_eq!(work_id_from_key("/works/OL82563W"), Some("OL82563W"));
/// assert_eq!(work_id_from_key("OL82563W"), Some("OL82563W"));
/// assert_eq!(work_id_from_key("/works/"), None);
/// ```
pub fn work_id_from_key(key: &str) -> Option<&str> {
    key.trim()
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// One page of search hits plus the overall hit count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Hits in API (relevance) order
    pub items: Vec<BookSummary>,

    /// Total number of hits across all pages
    pub total_count: u64,
}

impl SearchResult {
    /// Create a new search result
    pub fn new(items: Vec<BookSummary>, total_count: u64) -> Self {
        Self { items, total_count }
    }

    /// The empty result used for blank queries and failed fetches
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this page holds no hits
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Extended information for one work, fetched when a book is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetail {
    /// Subject headings
    pub subjects: Vec<String>,

    /// Normalized description text
    pub description: Option<String>,

    /// First publish date as given by the catalogue (free-form)
    pub first_publish_date: Option<String>,

    /// Number of editions
    pub edition_count: Option<u32>,

    /// Page count, when the catalogue records one
    pub number_of_pages: Option<u32>,
}

/// A `description` field as the catalogue sends it.
///
/// The works endpoint is inconsistent: the field may be a bare string, a typed
/// object carrying a `value`, or a list mixing both. [`Description::resolve`]
/// is the only way to turn it into display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Text(String),
    Wrapped {
        #[serde(default)]
        value: Option<String>,
    },
    Many(Vec<Description>),
}

impl Description {
    /// First non-blank string reachable from this value, depth first.
    pub fn resolve(&self) -> Option<String> {
        match self {
            Description::Text(text) => non_blank(text),
            Description::Wrapped { value } => value.as_deref().and_then(non_blank),
            Description::Many(entries) => entries.iter().find_map(Description::resolve),
        }
    }
}

fn non_blank(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Cover image size code understood by the covers CDN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl CoverSize {
    /// Single-letter code used in cover URLs
    pub fn code(&self) -> &'static str {
        match self {
            CoverSize::Small => "S",
            CoverSize::Medium => "M",
            CoverSize::Large => "L",
        }
    }
}

/// Build the cover image URL for a cover id. No request is made.
///
/// ```
/// use bookfinder::models::{cover_url, CoverSize};
///
/// assert_eq!(
///     cover_url("https://covers.openlibrary.org", 8231856, CoverSize::Medium),
///     "https://covers.openlibrary.org/b/id/8231856-M.jpg"
/// );
/// ```
pub fn cover_url(covers_base: &str, cover_id: i64, size: CoverSize) -> String {
    format!(
        "{}/b/id/{}-{}.jpg",
        covers_base.trim_end_matches('/'),
        cover_id,
        size.code()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_plain_string() {
        let desc: Description = serde_json::from_str(r#""x""#).unwrap();
        assert_eq!(desc.resolve(), Some("x".to_string()));
    }

    #[test]
    fn test_description_wrapped_value() {
        let desc: Description =
            serde_json::from_str(r#"{"type": "/type/text", "value": "x"}"#).unwrap();
        assert_eq!(desc.resolve(), Some("x".to_string()));
    }

    #[test]
    fn test_description_sequence_first_wins() {
        let desc: Description = serde_json::from_str(r#"["x", {"value": "y"}]"#).unwrap();
        assert_eq!(desc.resolve(), Some("x".to_string()));
    }

    #[test]
    fn test_description_sequence_skips_unresolvable() {
        let desc: Description =
            serde_json::from_str(r#"[{"type": "/type/text"}, "  ", {"value": "y"}]"#).unwrap();
        assert_eq!(desc.resolve(), Some("y".to_string()));
    }

    #[test]
    fn test_description_empty_sequence() {
        let desc: Description = serde_json::from_str("[]").unwrap();
        assert_eq!(desc.resolve(), None);
    }

    #[test]
    fn test_description_rejects_other_shapes() {
        assert!(serde_json::from_str::<Description>("42").is_err());
    }

    #[test]
    fn test_work_id_from_key() {
        assert_eq!(work_id_from_key("/works/OL45804W"), Some("OL45804W"));
        assert_eq!(work_id_from_key("/works/OL45804W/"), None);
        assert_eq!(work_id_from_key(""), None);
        assert_eq!(work_id_from_key("   "), None);
    }

    #[test]
    fn test_author_line_takes_two() {
        let book = BookSummary::new("/works/OL1W", "Good Omens")
            .authors(["Terry Pratchett", "Neil Gaiman", "Someone Else"]);
        assert_eq!(book.author_line(), "Terry Pratchett, Neil Gaiman");
    }

    #[test]
    fn test_cover_url_sizes() {
        let base = "https://covers.openlibrary.org/";
        assert_eq!(
            cover_url(base, 1, CoverSize::Small),
            "https://covers.openlibrary.org/b/id/1-S.jpg"
        );
        assert_eq!(
            cover_url(base, 1, CoverSize::Large),
            "https://covers.openlibrary.org/b/id/1-L.jpg"
        );
    }
}
