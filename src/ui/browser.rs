//! Interactive browsing over stdin.
//!
//! Plain lines are typed into the search box and committed once typing
//! pauses; lines starting with `:` are commands.

use std::io;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::models::SortOrder;
use crate::search::{BrowseSession, DetailState, QueryEvent, SessionUpdate};
use crate::ui::{Renderer, Status};

pub const HELP: &str = "\
Type a query and pause to search. An empty line clears the query.
Commands:
  :submit           search for the last typed text now
  :clear            clear the query and results
  :page N           go to page N
  :next / :prev     next or previous page
  :lang CODE|any    filter by language code (see `bookfinder languages`)
  :min YEAR|-       earliest first-publish year, or - to unset
  :max YEAR|-       latest first-publish year, or - to unset
  :sort ORDER       relevance, newest or oldest
  :open N           show details for result N
  :close            close the detail view
  :help             show this help
  :quit             exit";

/// One line of browser input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCommand {
    Type(String),
    Submit,
    Clear,
    Page(u32),
    Next,
    Prev,
    Language(Option<String>),
    MinYear(Option<i32>),
    MaxYear(Option<i32>),
    Sort(SortOrder),
    /// 1-based index into the visible results
    Open(usize),
    Close,
    Help,
    Quit,
}

fn parse_optional_year(arg: &str) -> Result<Option<i32>, String> {
    match arg {
        "" => Err("expected a year or -".to_string()),
        "-" => Ok(None),
        year => year
            .parse()
            .map(Some)
            .map_err(|_| format!("'{}' is not a year", year)),
    }
}

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<BrowserCommand, String> {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return Ok(BrowserCommand::Type(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "submit" | "s" => Ok(BrowserCommand::Submit),
        "clear" => Ok(BrowserCommand::Clear),
        "page" | "p" => arg
            .parse()
            .map(BrowserCommand::Page)
            .map_err(|_| format!("'{}' is not a page number", arg)),
        "next" | "n" => Ok(BrowserCommand::Next),
        "prev" => Ok(BrowserCommand::Prev),
        "lang" => match arg {
            "" => Err("expected a language code or 'any'".to_string()),
            "any" => Ok(BrowserCommand::Language(None)),
            code => Ok(BrowserCommand::Language(Some(code.to_string()))),
        },
        "min" => parse_optional_year(arg).map(BrowserCommand::MinYear),
        "max" => parse_optional_year(arg).map(BrowserCommand::MaxYear),
        "sort" => arg.parse().map(BrowserCommand::Sort),
        "open" | "o" => match arg.parse::<usize>() {
            Ok(index) if index > 0 => Ok(BrowserCommand::Open(index)),
            _ => Err(format!("'{}' is not a result number", arg)),
        },
        "close" => Ok(BrowserCommand::Close),
        "help" | "h" | "?" => Ok(BrowserCommand::Help),
        "quit" | "q" | "exit" => Ok(BrowserCommand::Quit),
        other => Err(format!("unknown command ':{}', try :help", other)),
    }
}

fn render_results(session: &BrowseSession, renderer: &Renderer) {
    let visible = session.visible_books();
    println!();
    if session.filters().is_active() {
        println!("{}", renderer.filters(session.filters()));
    }
    println!(
        "{}",
        renderer.results_page(&visible, session.result().total_count, &session.page_window())
    );
}

fn render_detail(session: &BrowseSession, renderer: &Renderer) {
    println!();
    println!(
        "{}",
        renderer.detail(session.selected_book(), session.detail_state())
    );
}

fn apply_command(
    session: &mut BrowseSession,
    renderer: &Renderer,
    command: BrowserCommand,
    last_typed: &mut String,
) {
    match command {
        BrowserCommand::Type(text) => {
            last_typed.clone_from(&text);
            session.handle_query(QueryEvent::Changed(text));
        }
        BrowserCommand::Submit => {
            let query = if last_typed.is_empty() {
                session.query().to_string()
            } else {
                last_typed.clone()
            };
            session.handle_query(QueryEvent::Submit(query));
        }
        BrowserCommand::Clear => {
            last_typed.clear();
            session.handle_query(QueryEvent::Clear);
            render_results(session, renderer);
        }
        BrowserCommand::Page(page) => {
            if !session.go_to_page(page) {
                println!("{}", renderer.status(Status::Warning, "No such page"));
            }
        }
        BrowserCommand::Next => {
            if !session.next_page() {
                println!("{}", renderer.status(Status::Warning, "Already on the last page"));
            }
        }
        BrowserCommand::Prev => {
            if !session.prev_page() {
                println!("{}", renderer.status(Status::Warning, "Already on the first page"));
            }
        }
        BrowserCommand::Language(language) => {
            let mut filters = session.filters().clone();
            filters.language = language;
            session.set_filters(filters);
            render_results(session, renderer);
        }
        BrowserCommand::MinYear(year) => {
            let mut filters = session.filters().clone();
            filters.min_year = year;
            session.set_filters(filters);
            render_results(session, renderer);
        }
        BrowserCommand::MaxYear(year) => {
            let mut filters = session.filters().clone();
            filters.max_year = year;
            session.set_filters(filters);
            render_results(session, renderer);
        }
        BrowserCommand::Sort(order) => {
            let mut filters = session.filters().clone();
            filters.sort_order = order;
            session.set_filters(filters);
            render_results(session, renderer);
        }
        BrowserCommand::Open(index) => {
            if !session.select(index - 1) {
                println!("{}", renderer.status(Status::Warning, "No such result"));
            } else if session.detail_state() == &DetailState::Unavailable {
                render_detail(session, renderer);
            } else {
                println!("{}", renderer.status(Status::Loading, "Loading details..."));
            }
        }
        BrowserCommand::Close => session.close_details(),
        BrowserCommand::Help => println!("{}", HELP),
        BrowserCommand::Quit => {}
    }
}

/// Run the interactive browser until `:quit` or end of input.
///
/// At end of input any query still being typed is committed and outstanding
/// requests are awaited before returning.
pub async fn run_browser(
    session: &mut BrowseSession,
    renderer: &Renderer,
    initial_query: Option<&str>,
) -> io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut errors = session.subscribe_errors();
    let mut last_typed = String::new();
    let mut input_open = true;

    println!("{}", HELP);
    if let Some(query) = initial_query.filter(|q| !q.trim().is_empty()) {
        last_typed = query.to_string();
        session.handle_query(QueryEvent::Submit(last_typed.clone()));
    }

    loop {
        if !input_open && session.is_idle() {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if input_open => match line? {
                None => {
                    input_open = false;
                    session.flush_input();
                }
                Some(line) => match parse_command(&line) {
                    Ok(BrowserCommand::Quit) => break,
                    Ok(command) => apply_command(session, renderer, command, &mut last_typed),
                    Err(message) => println!("{}", renderer.status(Status::Warning, &message)),
                },
            },
            update = session.next_update() => match update {
                Some(SessionUpdate::QueryCommitted { query, dispatched: true }) => {
                    println!(
                        "{}",
                        renderer.status(Status::Search, &format!("Searching for \"{}\"", query))
                    );
                }
                Some(SessionUpdate::QueryCommitted { dispatched: false, .. }) => {
                    render_results(session, renderer);
                }
                Some(SessionUpdate::ResultsApplied) => {
                    while let Ok(failure) = errors.try_recv() {
                        println!("{}", renderer.search_failure(&failure));
                    }
                    render_results(session, renderer);
                }
                Some(SessionUpdate::DetailsApplied) => render_detail(session, renderer),
                Some(SessionUpdate::InputIgnored | SessionUpdate::Stale) => {}
                None => break,
            },
        }
    }

    Ok(())
}
