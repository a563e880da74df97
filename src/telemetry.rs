//! Structured logging bootstrap for the command-line front end.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter {
        /// The rejected directive.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `directive` when it is set. Logs go to
/// standard error so command output on standard out stays machine-readable.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is malformed or a subscriber
/// is already installed.
pub fn init(directive: &str, json: bool) -> Result<(), TelemetryError> {
    let filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), directive)?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|err| TelemetryError::AlreadyInstalled(err.to_string()))
}

fn build_filter(override_directive: Option<&str>, directive: &str) -> Result<EnvFilter, TelemetryError> {
    let chosen = override_directive
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(directive);
    EnvFilter::try_new(chosen).map_err(|err| TelemetryError::InvalidFilter {
        directive: chosen.to_owned(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{TelemetryError, build_filter};

    #[test]
    fn configured_directive_is_used_without_override() {
        let filter = build_filter(None, "mcp_gateway=debug").expect("directive should parse");

        assert_eq!(filter.to_string(), "mcp_gateway=debug");
    }

    #[test]
    fn rust_log_wins_when_present() {
        let filter = build_filter(Some("warn"), "info").expect("directive should parse");

        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn malformed_directive_is_rejected() {
        let err = build_filter(None, "mcp_gateway=loud").expect_err("level should be rejected");

        assert!(matches!(err, TelemetryError::InvalidFilter { .. }));
    }
}
