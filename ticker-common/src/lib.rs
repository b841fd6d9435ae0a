//! Ticker Common - Shared configuration, validation and logging for the ticker catalog.
//!
//! This crate provides:
//! - Configuration types and loading (`~/.tickers/config.json`)
//! - Configuration validation
//! - Logging setup with noise filtering for HTTP internals

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod logging;
pub mod validation;

pub use config::{Config, ExchangeToggles, ExportConfig, ObservabilityConfig, ScreenerConfig};
pub use validation::{Validate, ValidationError, ValidationResult};
