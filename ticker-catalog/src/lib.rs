//! Ticker Catalog Library
//!
//! Builds an in-memory catalog of common stocks listed on NYSE, NASDAQ and
//! AMEX from the public Nasdaq screener, cleans out notes, warrants, funds
//! and illiquid shells, and lets callers filter, rank and export the result.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ NasdaqScreener│──▶│   Dataset     │──▶│   Dataset     │
//! │ (per exchange)│   │   Assembler   │   │   Cleaner     │
//! └───────────────┘   └───────────────┘   └───────┬───────┘
//!                                                 │
//!                     ┌───────────────┐   ┌───────▼───────┐   ┌───────────────┐
//!                     │  BucketScale  │◀──│ TickerCatalog │──▶│TickerExporter │
//!                     │  (10 points)  │   │ baseline/view │   │ (lines / csv) │
//!                     └───────────────┘   └───────────────┘   └───────────────┘
//! ```
//!
//! # Key Concepts
//!
//! - **Clean baseline**: the cleaned snapshot, fixed for a catalog's lifetime
//! - **Working view**: the subset produced by the latest filter or ranking;
//!   every `apply_filters` starts again from the baseline
//! - **Bucket scale**: ten log-spaced market cap thresholds in millions

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod catalog;
pub mod data;
pub mod error;

pub use catalog::{
    BucketScale, CleaningReport, DatasetCleaner, ExportFormat, FilterCriteria, Selection,
    TickerCatalog, TickerExporter, ViewState,
};
pub use data::{
    DatasetAssembler, Exchange, ExchangeSelection, FetchError, NasdaqScreener, RawTickerRow,
    ScreenerSource, Sector, TickerRow,
};
pub use error::{CatalogError, Result};
