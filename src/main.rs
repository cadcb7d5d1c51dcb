use anyhow::{bail, Context, Result};
use bookfinder::config::{
    default_config_path, find_config_file, get_config, load_config, write_default_config, Config,
};
use bookfinder::models::{cover_url, BookSummary, CoverSize, FilterCriteria, SortOrder, KNOWN_LANGUAGES};
use bookfinder::search::{project, BrowseSession, DetailError, DetailFetcher, DetailState, SearchOrchestrator};
use bookfinder::sources::{OpenLibrarySource, Source};
use bookfinder::ui::{run_browser, Renderer, SearchPageView, Status};
use bookfinder::utils::is_terminal;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Bookfinder - Search the Open Library catalogue from the terminal
#[derive(Parser, Debug)]
#[command(name = "bookfinder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search the Open Library catalogue from the terminal", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Catalogue base URL (overrides the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

/// Result ordering
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SortArg {
    /// Keep API order
    Relevance,
    /// Newest first publish year first
    Newest,
    /// Oldest first publish year first
    Oldest,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Relevance => SortOrder::Relevance,
            SortArg::Newest => SortOrder::Newest,
            SortArg::Oldest => SortOrder::Oldest,
        }
    }
}

/// Cover image size
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SizeArg {
    S,
    M,
    L,
}

impl From<SizeArg> for CoverSize {
    fn from(arg: SizeArg) -> Self {
        match arg {
            SizeArg::S => CoverSize::Small,
            SizeArg::M => CoverSize::Medium,
            SizeArg::L => CoverSize::Large,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for books
    #[command(visible_alias = "s")]
    Search {
        /// Search query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Result page
        #[arg(long, short, default_value_t = 1)]
        page: u32,

        /// Only books available in this language code (e.g. eng)
        #[arg(long, short)]
        language: Option<String>,

        /// Earliest first-publish year
        #[arg(long)]
        min_year: Option<i32>,

        /// Latest first-publish year
        #[arg(long)]
        max_year: Option<i32>,

        /// Result ordering
        #[arg(long, value_enum, default_value_t = SortArg::Relevance)]
        sort: SortArg,
    },

    /// Show details for a work key or id (e.g. /works/OL82563W)
    #[command(visible_alias = "d")]
    Details {
        /// Work key or id
        key: String,
    },

    /// Print the cover image URL for a cover id
    Cover {
        /// Cover id from a search result
        cover_id: i64,

        /// Image size
        #[arg(long, value_enum, default_value_t = SizeArg::M)]
        size: SizeArg,
    },

    /// Browse interactively: type to search, `:help` for commands
    #[command(visible_alias = "b")]
    Browse {
        /// Initial query (defaults to search.initial_query)
        #[arg(long)]
        query: Option<String>,
    },

    /// List the language filter codes
    Languages,

    /// Write a default configuration file
    InitConfig {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("Bookfinder - Environment Variables");
    println!();
    println!("API:");
    println!("  BOOKFINDER_BASE_URL                   Catalogue base URL (default: https://openlibrary.org)");
    println!("  OPENLIBRARY_BASE                      Fallback for BOOKFINDER_BASE_URL");
    println!("  BOOKFINDER_API__COVERS_URL            Cover CDN base URL");
    println!("  BOOKFINDER_API__TIMEOUT_SECS          Request timeout in seconds (default: 30)");
    println!("  BOOKFINDER_API__CONNECT_TIMEOUT_SECS  Connect timeout in seconds (default: 10)");
    println!("  BOOKFINDER_API__USER_AGENT            Custom User-Agent header");
    println!();
    println!("Search:");
    println!("  BOOKFINDER_SEARCH__PAGE_SIZE          Results per page (default: 20)");
    println!("  BOOKFINDER_SEARCH__DEBOUNCE_MS        Typing pause before searching (default: 400)");
    println!("  BOOKFINDER_SEARCH__MAX_PAGE_BUTTONS   Page buttons in the pagination bar (default: 5)");
    println!("  BOOKFINDER_SEARCH__INITIAL_QUERY      First query of `browse` (default: harry potter)");
    println!();
    println!("Logging:");
    println!("  BOOKFINDER_LOGGING__LEVEL             Log level (default: info)");
    println!("  BOOKFINDER_LOGGING__FORMAT            pretty or json (default: pretty)");
    println!("  RUST_LOG                              Overrides the log filter entirely");
    println!();
    println!("Example:");
    println!("  export BOOKFINDER_SEARCH__PAGE_SIZE=40");
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("bookfinder={}", level)),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.is_json() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Load configuration from `--config`, a default location, or the environment
fn resolve_config(cli: &Cli) -> Result<(Config, Option<PathBuf>)> {
    let path = cli.config.clone().or_else(find_config_file);
    let mut config = match &path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => get_config()?,
    };

    if let Some(timeout) = cli.timeout {
        config.api.timeout_secs = timeout;
    }
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    config.validate()?;

    Ok((config, path))
}

fn open_library(config: &Config) -> Result<Arc<dyn Source>> {
    Ok(Arc::new(OpenLibrarySource::new(&config.api)?))
}

fn renderer_for(config: &Config, format: OutputFormat) -> Renderer {
    if format == OutputFormat::Table && is_terminal() {
        Renderer::new(&config.api.covers_url, true)
    } else {
        Renderer::plain(&config.api.covers_url)
    }
}

fn print_plain_books(books: &[BookSummary]) {
    for (index, book) in books.iter().enumerate() {
        let year = book
            .first_publish_year
            .map(|y| format!(" ({})", y))
            .unwrap_or_default();
        println!("{}. {}{}", index + 1, book.title, year);
        if !book.author_names.is_empty() {
            println!("   by {}", book.author_line());
        }
        println!("   {}", book.id);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
        return Ok(());
    }

    let (config, config_path) = resolve_config(&cli)?;
    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let format = cli.output.resolve();

    match cli.command {
        Some(Commands::Search {
            query,
            page,
            language,
            min_year,
            max_year,
            sort,
        }) => {
            let query = query.join(" ");
            let mut orchestrator =
                SearchOrchestrator::new(open_library(&config)?, config.search.page_size);
            let mut errors = orchestrator.subscribe_errors();

            orchestrator.search(&query, page).await;
            let failure = errors.try_recv().ok();
            if let Some(failure) = &failure {
                eprintln!("{}", renderer_for(&config, format).search_failure(failure));
            }

            let filters = FilterCriteria {
                language,
                min_year,
                max_year,
                sort_order: sort.into(),
            };
            let result = orchestrator.result();
            let visible = project(&result.items, &filters);
            let window = orchestrator
                .pagination()
                .window(config.search.max_page_buttons);

            match format {
                OutputFormat::Json => {
                    let view = SearchPageView {
                        query: &query,
                        page: window.current_page,
                        total_pages: window.total_pages,
                        total_count: result.total_count,
                        items: &visible,
                        error: failure.map(|f| f.error.to_string()),
                    };
                    println!("{}", serde_json::to_string_pretty(&view)?);
                }
                OutputFormat::Plain => {
                    let renderer = Renderer::plain(&config.api.covers_url);
                    println!("{}", renderer.summary(result.total_count));
                    print_plain_books(&visible);
                    println!("Page {} of {}", window.current_page, window.total_pages);
                }
                _ => {
                    let renderer = renderer_for(&config, format);
                    if filters.is_active() {
                        println!("{}", renderer.filters(&filters));
                    }
                    println!(
                        "{}",
                        renderer.results_page(&visible, result.total_count, &window)
                    );
                }
            }
        }

        Some(Commands::Details { key }) => {
            let fetcher = DetailFetcher::new(open_library(&config)?);
            let state = match fetcher.fetch_details(&key).await {
                Ok(detail) => DetailState::Loaded(detail),
                Err(DetailError::NoIdentifier) => DetailState::Unavailable,
                Err(e) => return Err(e).with_context(|| format!("Failed to fetch details for {}", key)),
            };

            match (&state, format) {
                (DetailState::Loaded(detail), OutputFormat::Json) => {
                    println!("{}", serde_json::to_string_pretty(detail)?);
                }
                _ => {
                    let renderer = renderer_for(&config, format);
                    println!("{}", renderer.detail(None, &state));
                }
            }
        }

        Some(Commands::Cover { cover_id, size }) => {
            println!("{}", cover_url(&config.api.covers_url, cover_id, size.into()));
        }

        Some(Commands::Browse { query }) => {
            let mut session = BrowseSession::new(open_library(&config)?, &config.search);
            let renderer = Renderer::new(&config.api.covers_url, is_terminal());
            let initial = query.unwrap_or_else(|| config.search.initial_query.clone());
            run_browser(&mut session, &renderer, Some(&initial)).await?;
        }

        Some(Commands::Languages) => match format {
            OutputFormat::Json => {
                let languages: Vec<_> = KNOWN_LANGUAGES
                    .iter()
                    .map(|(code, label)| serde_json::json!({ "code": code, "label": label }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&languages)?);
            }
            OutputFormat::Plain => {
                for (code, label) in KNOWN_LANGUAGES {
                    println!("{}\t{}", code, label);
                }
            }
            _ => println!("{}", renderer_for(&config, format).languages()),
        },

        Some(Commands::InitConfig { path, force }) => {
            let path = path.unwrap_or_else(default_config_path);
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            write_default_config(&path)?;
            if !cli.quiet {
                let renderer = renderer_for(&config, OutputFormat::Table);
                println!(
                    "{}",
                    renderer.status(
                        Status::Success,
                        &format!("Wrote default configuration to {}", path.display())
                    )
                );
            }
        }

        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}
