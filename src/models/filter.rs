//! Client-side filter criteria applied to a fetched result page.

use serde::{Deserialize, Serialize};

/// Display order for the result grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Keep the order the API returned
    #[default]
    Relevance,
    /// Most recent first publish year first
    Newest,
    /// Oldest first publish year first
    Oldest,
}

impl SortOrder {
    /// Lowercase name as used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(SortOrder::Relevance),
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            other => Err(format!(
                "unknown sort order '{}' (expected relevance, newest or oldest)",
                other
            )),
        }
    }
}

/// Filter and sort settings chosen by the user.
///
/// Changing these never triggers a fetch; the projector recomputes the visible
/// list from the raw page instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Language code that must appear in a book's languages
    pub language: Option<String>,

    /// Inclusive lower bound on the first publish year
    pub min_year: Option<i32>,

    /// Inclusive upper bound on the first publish year
    pub max_year: Option<i32>,

    /// Display order
    pub sort_order: SortOrder,
}

impl FilterCriteria {
    /// Criteria that keep everything in API order
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language filter
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the minimum year
    pub fn min_year(mut self, year: i32) -> Self {
        self.min_year = Some(year);
        self
    }

    /// Set the maximum year
    pub fn max_year(mut self, year: i32) -> Self {
        self.max_year = Some(year);
        self
    }

    /// Set the sort order
    pub fn sort(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// The language filter, treating an empty code as unset
    pub fn active_language(&self) -> Option<&str> {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    /// Whether any filter or a non-default sort is in effect
    pub fn is_active(&self) -> bool {
        self.active_language().is_some()
            || self.min_year.is_some()
            || self.max_year.is_some()
            || self.sort_order != SortOrder::Relevance
    }
}

/// Language codes offered as filter choices, with display labels.
pub const KNOWN_LANGUAGES: &[(&str, &str)] = &[
    ("eng", "English"),
    ("spa", "Spanish"),
    ("fre", "French"),
    ("deu", "German"),
    ("ita", "Italian"),
    ("hin", "Hindi"),
    ("tam", "Tamil"),
    ("tel", "Telugu"),
];

/// Display label for a language code, if it is one of [`KNOWN_LANGUAGES`]
pub fn language_label(code: &str) -> Option<&'static str> {
    KNOWN_LANGUAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("newest".parse::<SortOrder>(), Ok(SortOrder::Newest));
        assert_eq!(" Oldest ".parse::<SortOrder>(), Ok(SortOrder::Oldest));
        assert!("random".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_sort_order_serde() {
        let json = serde_json::to_string(&SortOrder::Relevance).unwrap();
        assert_eq!(json, r#""relevance""#);
    }

    #[test]
    fn test_empty_language_is_inactive() {
        let criteria = FilterCriteria::new().language("");
        assert_eq!(criteria.active_language(), None);
        assert!(!criteria.is_active());
    }

    #[test]
    fn test_language_label() {
        assert_eq!(language_label("fre"), Some("French"));
        assert_eq!(language_label("xyz"), None);
    }
}
