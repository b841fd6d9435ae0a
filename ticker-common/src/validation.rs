//! Configuration validation.
//!
//! Checks that loaded configuration values are present and within valid
//! ranges before any network or file work starts.

use std::path::Path;

use thiserror::Error;

use crate::config::{Config, ExportConfig, ObservabilityConfig, ScreenerConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors: Vec<ValidationError> = [
            self.screener.validate(),
            self.export.validate(),
            self.observability.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load from `path` (or the default location), apply environment
    /// overrides and validate.
    pub fn load_and_validate(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
        Ok(config)
    }
}

impl Validate for ScreenerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "screener.base_url".into(),
            });
        }

        match url::Url::parse(&self.base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(ValidationError::InvalidValue {
                    field: "screener.base_url".into(),
                    reason: format!("unsupported scheme '{}'", parsed.scheme()),
                });
            }
            Err(e) => {
                return Err(ValidationError::InvalidValue {
                    field: "screener.base_url".into(),
                    reason: e.to_string(),
                });
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "screener.request_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "screener.connect_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.user_agent.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "screener.user_agent".into(),
            });
        }

        if !self.exchanges.any_enabled() {
            return Err(ValidationError::InvalidValue {
                field: "screener.exchanges".into(),
                reason: "at least one exchange must be enabled".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ExportConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_formats = ["lines", "txt", "csv"];
        if !valid_formats.contains(&self.format.trim().to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "export.format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        if let Some(name) = &self.filename {
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(ValidationError::InvalidValue {
                    field: "export.filename".into(),
                    reason: "must be a plain, non-empty file name".into(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}
