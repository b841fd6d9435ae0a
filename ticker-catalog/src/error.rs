//! Error types for the ticker catalog.

use std::path::PathBuf;

use thiserror::Error;

use crate::data::{Exchange, FetchError};

/// Result type alias using the catalog error type.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failures surfaced by the catalog pipeline.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// One exchange's screener request failed
    #[error("Fetching {exchange} listings failed: {source}")]
    RemoteFetch {
        exchange: Exchange,
        #[source]
        source: FetchError,
    },

    /// No usable dataset could be assembled
    #[error("Assembly failed: {0}")]
    Assembly(String),

    /// Filter or ranking input rejected before any state change
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Export write failure
    #[error("Export to {} failed: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if retrying the same call could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::RemoteFetch { source, .. } => source.is_recoverable(),
            Self::Assembly(_) | Self::Validation(_) | Self::Io { .. } => false,
        }
    }
}
