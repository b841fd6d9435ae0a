//! Listing data: exchanges, sectors and ticker rows.
//!
//! Rows arrive from the screener as text ([`RawTickerRow`]) and become
//! typed [`TickerRow`]s once market cap and volume have been coerced to
//! integers.

pub mod assembler;
pub mod nasdaq;
pub mod provider;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use assembler::{Assembly, AssemblyReport, DatasetAssembler, ExchangeFailure, ExchangeSelection};
pub use nasdaq::NasdaqScreener;
pub use provider::{is_common_stock_symbol, FetchError, ScreenerSource};

/// Canonical column set, in output order.
pub const COLUMNS: [&str; 11] = [
    "symbol",
    "name",
    "exchange",
    "marketCap",
    "sector",
    "industry",
    "lastsale",
    "volume",
    "ipoyear",
    "country",
    "url",
];

// ============================================================================
// Exchange
// ============================================================================

/// Listing venue recognized by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Nyse,
    Nasdaq,
    Amex,
}

impl Exchange {
    /// All exchanges in fetch order.
    pub const ALL: [Exchange; 3] = [Exchange::Nyse, Exchange::Nasdaq, Exchange::Amex];

    /// Lowercase code used in the data and in screener queries.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Nyse => "nyse",
            Self::Nasdaq => "nasdaq",
            Self::Amex => "amex",
        }
    }

    /// Uppercase label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Nyse => "NYSE",
            Self::Nasdaq => "NASDAQ",
            Self::Amex => "AMEX",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nyse" => Ok(Self::Nyse),
            "nasdaq" => Ok(Self::Nasdaq),
            "amex" => Ok(Self::Amex),
            _ => Err(format!("Unknown exchange: {}", s)),
        }
    }
}

// ============================================================================
// Sector
// ============================================================================

/// Industry sector classification attached to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    #[serde(rename = "Basic Materials")]
    BasicMaterials,
    #[serde(rename = "Consumer Discretionary")]
    ConsumerDiscretionary,
    #[serde(rename = "Consumer Staples")]
    ConsumerStaples,
    Energy,
    Finance,
    #[serde(rename = "Health Care")]
    HealthCare,
    Industrials,
    Miscellaneous,
    #[serde(rename = "Real Estate")]
    RealEstate,
    Technology,
    Telecommunications,
    Utilities,
}

impl Sector {
    pub const ALL: [Sector; 12] = [
        Sector::BasicMaterials,
        Sector::ConsumerDiscretionary,
        Sector::ConsumerStaples,
        Sector::Energy,
        Sector::Finance,
        Sector::HealthCare,
        Sector::Industrials,
        Sector::Miscellaneous,
        Sector::RealEstate,
        Sector::Technology,
        Sector::Telecommunications,
        Sector::Utilities,
    ];

    /// Display name as it appears in screener data.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BasicMaterials => "Basic Materials",
            Self::ConsumerDiscretionary => "Consumer Discretionary",
            Self::ConsumerStaples => "Consumer Staples",
            Self::Energy => "Energy",
            Self::Finance => "Finance",
            Self::HealthCare => "Health Care",
            Self::Industrials => "Industrials",
            Self::Miscellaneous => "Miscellaneous",
            Self::RealEstate => "Real Estate",
            Self::Technology => "Technology",
            Self::Telecommunications => "Telecommunications",
            Self::Utilities => "Utilities",
        }
    }

    /// Map an upstream sector cell. Empty or unknown values mean "unset".
    pub fn from_upstream(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sector {
    type Err = String;

    /// Exact match on the display name, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|sector| sector.name() == trimmed)
            .ok_or_else(|| format!("Unknown sector: {}", s))
    }
}

// ============================================================================
// Raw Row
// ============================================================================

/// One screener row restricted to the canonical columns, still as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTickerRow {
    pub symbol: String,
    pub name: String,
    pub exchange: Exchange,
    /// Market capitalization in currency units; may be missing or empty
    #[serde(rename = "marketCap")]
    pub market_cap: Option<String>,
    pub sector: String,
    pub industry: String,
    /// Last sale price, e.g. "$12.34"
    #[serde(rename = "lastsale")]
    pub last_sale: String,
    pub volume: Option<String>,
    #[serde(rename = "ipoyear")]
    pub ipo_year: String,
    pub country: String,
    pub url: String,
}

impl RawTickerRow {
    /// Create a row with only the identifying columns filled in.
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, exchange: Exchange) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            exchange,
            market_cap: None,
            sector: String::new(),
            industry: String::new(),
            last_sale: String::new(),
            volume: None,
            ipo_year: String::new(),
            country: String::new(),
            url: String::new(),
        }
    }

    pub fn with_market_cap(mut self, market_cap: impl Into<String>) -> Self {
        self.market_cap = Some(market_cap.into());
        self
    }

    pub fn with_volume(mut self, volume: impl Into<String>) -> Self {
        self.volume = Some(volume.into());
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = sector.into();
        self
    }
}

// ============================================================================
// Ticker Row
// ============================================================================

/// A tradable instrument with numeric market cap and volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRow {
    pub symbol: String,
    pub name: String,
    pub exchange: Exchange,
    /// Market capitalization in currency units
    pub market_cap: u64,
    pub sector: Option<Sector>,
    pub industry: String,
    pub last_sale: Option<f64>,
    pub volume: u64,
    pub ipo_year: Option<u16>,
    pub country: String,
    pub url: String,
}

impl TickerRow {
    /// Coerce a raw row. Returns `None` when market cap or volume is not a number.
    pub fn coerce(raw: RawTickerRow) -> Option<Self> {
        let market_cap = parse_whole_number(raw.market_cap.as_deref()?)?;
        let volume = parse_whole_number(raw.volume.as_deref()?)?;

        Some(Self {
            symbol: raw.symbol,
            name: raw.name,
            exchange: raw.exchange,
            market_cap,
            sector: Sector::from_upstream(&raw.sector),
            industry: raw.industry,
            last_sale: parse_price(&raw.last_sale),
            volume,
            ipo_year: raw.ipo_year.trim().parse().ok(),
            country: raw.country,
            url: raw.url,
        })
    }

    /// Market capitalization in millions, rounded to 2 decimals.
    pub fn market_cap_millions(&self) -> f64 {
        round_to(self.market_cap as f64 / 1_000_000.0, 2)
    }
}

/// Parse a non-negative number, truncating any fraction.
///
/// Tolerates a leading `$` and thousands separators. Empty, negative and
/// non-finite inputs yield `None`.
pub fn parse_whole_number(text: &str) -> Option<u64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    Some(value.trunc() as u64)
}

fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ============================================================================
// Tests
// ============================================================================
