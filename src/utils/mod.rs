//! Utilities shared by the sources, the search core and the terminal front end.
//!
//! - [`HttpClient`]: configured reqwest client shared by catalogue sources
//! - [`Debouncer`]: quiet-period debouncing of user input
//! - [`truncate_with_ellipsis`], [`truncate_at_word`], [`format_number`]: text
//!   fitting for terminal output

mod debounce;
mod display;
mod http;

pub use debounce::Debouncer;
pub use display::{
    display_width, format_number, is_terminal, terminal_width, truncate_at_word,
    truncate_with_ellipsis, DEFAULT_WIDTH,
};
pub use http::HttpClient;
