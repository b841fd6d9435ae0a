//! Ticker list export.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use ticker_common::config::ExportConfig;

use crate::error::{CatalogError, Result};

// ============================================================================
// Export Format
// ============================================================================

/// Layout of an exported ticker list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// One symbol per line
    #[default]
    Lines,
    /// All symbols on one comma-separated line
    Csv,
}

impl ExportFormat {
    pub fn default_filename(&self) -> &'static str {
        match self {
            Self::Lines => "tickers.txt",
            Self::Csv => "tickers.csv",
        }
    }

    /// Render symbols in this format, with a trailing newline.
    ///
    /// An empty list renders as an empty file.
    pub fn render(&self, symbols: &[String]) -> String {
        if symbols.is_empty() {
            return String::new();
        }
        let separator = match self {
            Self::Lines => "\n",
            Self::Csv => ",",
        };
        let mut content = symbols.join(separator);
        content.push('\n');
        content
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lines => write!(f, "lines"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lines" | "txt" => Ok(Self::Lines),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

// ============================================================================
// Ticker Exporter
// ============================================================================

/// Writes ticker lists into a directory.
#[derive(Debug, Clone)]
pub struct TickerExporter {
    dir: PathBuf,
    format: ExportFormat,
    filename: Option<String>,
}

impl TickerExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            format: ExportFormat::default(),
            filename: None,
        }
    }

    /// Create from the export section of the config.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        let format = config.format.parse().map_err(CatalogError::Validation)?;
        Ok(Self {
            dir: config.resolve_dir(),
            format,
            filename: config.filename.clone(),
        })
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Full path the next export writes to.
    pub fn target_path(&self) -> PathBuf {
        let name = self
            .filename
            .as_deref()
            .unwrap_or_else(|| self.format.default_filename());
        self.dir.join(name)
    }

    /// Write a sorted copy of `tickers`. The directory must already exist.
    pub fn export(&self, tickers: &[String]) -> Result<PathBuf> {
        let mut sorted = tickers.to_vec();
        sorted.sort();

        let path = self.target_path();
        write_file(&path, &self.format.render(&sorted))?;

        info!(
            path = %path.display(),
            format = %self.format,
            tickers = sorted.len(),
            "Exported ticker list"
        );
        Ok(path)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}
