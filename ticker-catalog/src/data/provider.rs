//! Screener source abstraction.
//!
//! Defines the `ScreenerSource` trait every listing source implements, so the
//! assembler can work against the live screener or a substitute.

use async_trait::async_trait;
use thiserror::Error;

use super::{Exchange, RawTickerRow};

// ============================================================================
// Fetch Error
// ============================================================================

/// Errors raised while fetching one exchange's listing.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connection failed or was reset
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not the expected screener table
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Check if a caller-side retry is worth attempting.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) => false,
        }
    }

    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// Screener Source Trait
// ============================================================================

/// A source of per-exchange listing tables.
#[async_trait]
pub trait ScreenerSource: Send + Sync {
    /// Source name for logs (e.g., "nasdaq-screener")
    fn name(&self) -> &'static str;

    /// Fetch every listing for one exchange.
    ///
    /// Rows carry the queried exchange and never contain symbols with `.`
    /// or `^` (preferred shares, units and other share classes).
    async fn fetch_exchange(&self, exchange: Exchange) -> Result<Vec<RawTickerRow>, FetchError>;
}

/// True for plain common-stock symbols.
pub fn is_common_stock_symbol(symbol: &str) -> bool {
    !symbol.contains(['.', '^'])
}

// ============================================================================
// Tests
// ============================================================================
