//! Logging setup.
//!
//! Structured logging via `tracing`, rendered either as JSON or as
//! human-readable lines.
//!
//! # Noise Filtering
//!
//! Noisy HTTP/TLS library modules (hyper, reqwest, h2, rustls) are held at
//! `warn` so a screener download doesn't drown the catalog's own log lines.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

/// Modules filtered to `warn` by default.
pub const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

/// Build the filter directive string for a base level plus exclusions.
pub fn filter_directives(log_level: &str, excluded_targets: &[String]) -> String {
    let mut directives = String::from(log_level);

    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }

    for target in excluded_targets {
        directives.push_str(&format!(",{}=warn", target));
    }

    directives
}

fn is_json_format(log_format: &str) -> bool {
    log_format.trim().eq_ignore_ascii_case("json")
}

/// Build the EnvFilter. `RUST_LOG` wins when set.
fn build_filter(log_level: &str, excluded_targets: &[String]) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::new(filter_directives(log_level, excluded_targets))
}

/// Initialize logging.
///
/// # Arguments
///
/// * `log_level` - Base log level (trace, debug, info, warn, error)
/// * `log_format` - "json" for structured JSON, anything else for pretty output
pub fn init_logging(log_level: &str, log_format: &str) {
    init_logging_with_exclusions(log_level, log_format, &[]);
}

/// Initialize logging from the observability section of the config.
pub fn init_from_config(config: &ObservabilityConfig) {
    init_logging_with_exclusions(
        &config.log_level,
        &config.log_format,
        &config.excluded_targets,
    );
}

/// Like `init_logging`, with additional modules held at `warn`.
pub fn init_logging_with_exclusions(
    log_level: &str,
    log_format: &str,
    excluded_targets: &[String],
) {
    let filter = build_filter(log_level, excluded_targets);
    let subscriber = tracing_subscriber::registry().with(filter);

    if is_json_format(log_format) {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(fmt_layer).try_init();
    }

    tracing::debug!(
        log_level = %log_level,
        log_format = %log_format,
        noise_filtered = NOISY_MODULES.len() + excluded_targets.len(),
        "Logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_include_noise_suppression() {
        let directives = filter_directives("debug", &[]);
        assert!(directives.starts_with("debug"));
        for module in NOISY_MODULES {
            assert!(directives.contains(&format!("{}=warn", module)));
        }
    }

    #[test]
    fn test_filter_directives_custom_exclusions() {
        let directives = filter_directives("info", &["wiremock".to_string()]);
        assert!(directives.ends_with(",wiremock=warn"));
    }

    #[test]
    fn test_json_format_is_case_insensitive() {
        for format in ["json", "JSON", "Json "] {
            assert!(is_json_format(format), "{}", format);
        }
        assert!(!is_json_format("pretty"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging("info", "pretty");
        init_logging("debug", "json");
    }
}
