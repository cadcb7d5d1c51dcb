//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `BOOKFINDER_*` environment variables (nested keys use `__`, e.g.
//! `BOOKFINDER_SEARCH__DEBOUNCE_MS=250`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "https://openlibrary.org"
//! covers_url = "https://covers.openlibrary.org"
//! timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [search]
//! page_size = 20
//! debounce_ms = 400
//! max_page_buttons = 5
//! initial_query = "harry potter"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public Open Library instance
pub const DEFAULT_BASE_URL: &str = "https://openlibrary.org";

/// Public cover image CDN
pub const DEFAULT_COVERS_URL: &str = "https://covers.openlibrary.org";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Search behaviour
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the catalogue API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the cover image CDN
    #[serde(default = "default_covers_url")]
    pub covers_url: String,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Custom user agent (defaults to `bookfinder/<version>`)
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            covers_url: default_covers_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: None,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_base_url() -> String {
    std::env::var("BOOKFINDER_BASE_URL")
        .or_else(|_| std::env::var("OPENLIBRARY_BASE"))
        .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn default_covers_url() -> String {
    DEFAULT_COVERS_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Search behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Hits requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Quiet period before a typed query is committed (milliseconds)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Number of page buttons shown in the pagination bar
    #[serde(default = "default_max_page_buttons")]
    pub max_page_buttons: u32,

    /// Query the interactive browser starts with
    #[serde(default = "default_initial_query")]
    pub initial_query: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            max_page_buttons: default_max_page_buttons(),
            initial_query: default_initial_query(),
        }
    }
}

impl SearchConfig {
    /// Debounce quiet period as a [`Duration`]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_page_size() -> u32 {
    20
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_max_page_buttons() -> u32 {
    5
}

fn default_initial_query() -> String {
    "harry potter".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "pretty" (default) or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Whether log lines should be emitted as JSON
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl Config {
    /// Check that URLs parse and numeric settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("api.base_url", &self.api.base_url),
            ("api.covers_url", &self.api.covers_url),
        ] {
            url::Url::parse(value).map_err(|e| ConfigError::Invalid {
                field,
                reason: format!("'{}' is not a valid URL: {}", value, e),
            })?;
        }

        if self.search.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "search.page_size",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.search.debounce_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "search.debounce_ms",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Render this configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(env_source())
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Get the configuration from environment variables and defaults only
pub fn get_config() -> Result<Config, ConfigError> {
    let settings = config::Config::builder().add_source(env_source()).build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix("BOOKFINDER")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Locate a configuration file in the default locations.
///
/// Checks `./bookfinder.toml`, then `<config dir>/bookfinder/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("bookfinder.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("bookfinder").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Write the default configuration to `path`, creating parent directories
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    Ok(())
}

/// Default location for `init-config`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("bookfinder").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("bookfinder.toml"))
}
