//! Text fitting helpers for terminal output.

use std::io::{self, IsTerminal};
use std::sync::OnceLock;

use unicode_width::UnicodeWidthChar;

/// Width used when the terminal size cannot be determined.
pub const DEFAULT_WIDTH: usize = 100;

const ELLIPSIS: &str = "...";

static WIDTH: OnceLock<usize> = OnceLock::new();

/// Terminal width in columns, read once.
pub fn terminal_width() -> usize {
    *WIDTH.get_or_init(|| {
        terminal_size::terminal_size()
            .map(|(w, _)| usize::from(w.0))
            .unwrap_or(DEFAULT_WIDTH)
    })
}

/// Whether stdout is attached to a terminal.
pub fn is_terminal() -> bool {
    io::stdout().is_terminal()
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Display width of `text`, counting wide characters as two columns.
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// Cut `text` to at most `max_width` columns, ending in `...` when cut.
///
/// ```
/// use bookfinder::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("The Hobbit", 20), "The Hobbit");
/// assert_eq!(truncate_with_ellipsis("The Fellowship of the Ring", 12), "The Fello...");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width <= ELLIPSIS.len() {
        return ELLIPSIS[..max_width].to_string();
    }

    let budget = max_width - ELLIPSIS.len();
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = char_width(c);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(ELLIPSIS);
    out
}

/// Like [`truncate_with_ellipsis`] but prefers to cut between words.
pub fn truncate_at_word(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }

    let cut = truncate_with_ellipsis(text, max_width);
    let kept = cut.trim_end_matches(ELLIPSIS);
    match kept.rfind(' ') {
        Some(space) if space > 0 => format!("{}{}", kept[..space].trim_end(), ELLIPSIS),
        _ => cut,
    }
}

/// Format a count with thousands separators, e.g. `12,345`.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_with_ellipsis("Dune", 10), "Dune");
        assert_eq!(truncate_with_ellipsis("", 0), "");
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("Hello", 2), "..");
    }

    #[test]
    fn test_truncate_wide_characters() {
        // Each CJK character is two columns wide
        let result = truncate_with_ellipsis("吾輩は猫である", 9);
        assert_eq!(result, "吾輩は...");
        assert!(display_width(&result) <= 9);
    }

    #[test]
    fn test_truncate_at_word() {
        assert_eq!(
            truncate_at_word("The quick brown fox", 14),
            "The quick..."
        );
        assert_eq!(truncate_at_word("Supercalifragilistic", 10), "Superca...");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
