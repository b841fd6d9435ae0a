//! Configuration management for the ticker catalog.
//!
//! The CLI and the library share a single configuration file at
//! `~/.tickers/config.json`. Every field is optional; missing fields take
//! their defaults.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (TICKERS_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `TICKERS_LOG_LEVEL` → observability.log_level
//! - `TICKERS_LOG_FORMAT` → observability.log_format
//! - `TICKERS_SCREENER_URL` → screener.base_url
//! - `TICKERS_HTTP_TIMEOUT_SECS` → screener.request_timeout_secs
//! - `TICKERS_EXPORT_DIR` → export.dir

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".tickers"),
        |dirs| dirs.home_dir().join(".tickers"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// The user's downloads directory, falling back to `~/Downloads`.
pub fn default_download_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from("Downloads"),
        |dirs| {
            dirs.download_dir()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dirs.home_dir().join("Downloads"))
        },
    )
}

// ============================================================================
// Screener Source Configuration
// ============================================================================

/// Public screener endpoint returning the full listing per exchange.
pub const DEFAULT_SCREENER_URL: &str = "https://api.nasdaq.com/api/screener/stocks";

/// Browser user agent; the endpoint rejects requests that don't look like a page load.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/83.0.4103.116 Safari/537.36";

/// Remote screener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Screener endpoint URL
    #[serde(default = "default_screener_url")]
    pub base_url: String,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// TCP/TLS connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Which exchanges to download
    #[serde(default)]
    pub exchanges: ExchangeToggles,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            base_url: default_screener_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
            exchanges: ExchangeToggles::default(),
        }
    }
}

impl ScreenerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_screener_url() -> String {
    DEFAULT_SCREENER_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Per-exchange download switches. All enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeToggles {
    #[serde(default = "default_true")]
    pub nyse: bool,
    #[serde(default = "default_true")]
    pub nasdaq: bool,
    #[serde(default = "default_true")]
    pub amex: bool,
}

impl Default for ExchangeToggles {
    fn default() -> Self {
        Self {
            nyse: true,
            nasdaq: true,
            amex: true,
        }
    }
}

impl ExchangeToggles {
    /// True if at least one exchange is switched on.
    pub fn any_enabled(&self) -> bool {
        self.nyse || self.nasdaq || self.amex
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Export Configuration
// ============================================================================

/// Where and how the ticker list is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Target directory (supports `~`). Defaults to the downloads directory.
    #[serde(default)]
    pub dir: Option<String>,

    /// Output format: "lines" (one symbol per line) or "csv" (single line)
    #[serde(default = "default_export_format")]
    pub format: String,

    /// File name override. Defaults depend on the format.
    #[serde(default)]
    pub filename: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: default_export_format(),
            filename: None,
        }
    }
}

impl ExportConfig {
    /// Resolve the export directory, expanding `~`.
    pub fn resolve_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => default_download_dir(),
        }
    }
}

fn default_export_format() -> String {
    "lines".to_string()
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to hold at `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote screener settings
    #[serde(default)]
    pub screener: ScreenerConfig,

    /// Export sink settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging settings
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("TICKERS_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("TICKERS_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(url) = lookup("TICKERS_SCREENER_URL") {
            self.screener.base_url = url;
        }
        if let Some(secs) = lookup("TICKERS_HTTP_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(s) => self.screener.request_timeout_secs = s,
                Err(_) => tracing::warn!(value = %secs, "Ignoring non-numeric TICKERS_HTTP_TIMEOUT_SECS"),
            }
        }
        if let Some(dir) = lookup("TICKERS_EXPORT_DIR") {
            self.export.dir = Some(dir);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
