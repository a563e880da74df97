//! Process configuration read from environment variables.
//!
//! Missing variables take their defaults; malformed values are rejected
//! rather than silently replaced.

use crate::registry::services::GatewaySettings;
use std::time::Duration;
use thiserror::Error;

/// Postgres connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Upper bound on pooled database connections.
pub const DATABASE_MAX_CONNECTIONS_ENV: &str = "DATABASE_MAX_CONNECTIONS";
/// Seconds allowed for opening a backend session.
pub const SESSION_OPEN_TIMEOUT_ENV: &str = "MCP_GATEWAY_SESSION_OPEN_TIMEOUT_SECS";
/// Seconds allowed for a single tool call.
pub const TOOL_CALL_TIMEOUT_ENV: &str = "MCP_GATEWAY_TOOL_CALL_TIMEOUT_SECS";
/// Tracing filter directive.
pub const LOG_FILTER_ENV: &str = "MCP_GATEWAY_LOG";
/// Whether log lines are emitted as JSON.
pub const LOG_JSON_ENV: &str = "MCP_GATEWAY_LOG_JSON";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_LOG_FILTER: &str = "info";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("environment variable {0} is required")]
    Missing(&'static str),

    /// A variable holds a value of the wrong shape.
    #[error("environment variable {variable} has invalid value '{value}': expected {expected}")]
    Invalid {
        /// Variable name.
        variable: &'static str,
        /// Offending value.
        value: String,
        /// Description of the accepted values.
        expected: &'static str,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Gateway process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Postgres connection string, when configured.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub database_max_connections: u32,
    /// Time allowed for opening a backend session.
    pub session_open_timeout: Duration,
    /// Time allowed for a single tool call.
    pub tool_call_timeout: Duration,
    /// Tracing filter directive.
    pub log_filter: String,
    /// Whether log lines are emitted as JSON.
    pub log_json: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let settings = GatewaySettings::default();
        Self {
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            session_open_timeout: settings.session_open_timeout,
            tool_call_timeout: settings.tool_call_timeout,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            log_json: false,
        }
    }
}

impl GatewayConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for malformed values.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for malformed values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let database_max_connections = match read(DATABASE_MAX_CONNECTIONS_ENV) {
            Some(raw) => parse_positive(DATABASE_MAX_CONNECTIONS_ENV, &raw)?,
            None => defaults.database_max_connections,
        };
        let session_open_timeout = match read(SESSION_OPEN_TIMEOUT_ENV) {
            Some(raw) => Duration::from_secs(parse_positive(SESSION_OPEN_TIMEOUT_ENV, &raw)?.into()),
            None => defaults.session_open_timeout,
        };
        let tool_call_timeout = match read(TOOL_CALL_TIMEOUT_ENV) {
            Some(raw) => Duration::from_secs(parse_positive(TOOL_CALL_TIMEOUT_ENV, &raw)?.into()),
            None => defaults.tool_call_timeout,
        };
        let log_json = match read(LOG_JSON_ENV) {
            Some(raw) => parse_flag(LOG_JSON_ENV, &raw)?,
            None => defaults.log_json,
        };

        Ok(Self {
            database_url: read(DATABASE_URL_ENV),
            database_max_connections,
            session_open_timeout,
            tool_call_timeout,
            log_filter: read(LOG_FILTER_ENV).unwrap_or(defaults.log_filter),
            log_json,
        })
    }

    /// Returns the database URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `DATABASE_URL` is unset.
    pub fn require_database_url(&self) -> ConfigResult<&str> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing(DATABASE_URL_ENV))
    }

    /// Returns the timeouts the gateway service consumes.
    #[must_use]
    pub const fn settings(&self) -> GatewaySettings {
        GatewaySettings {
            session_open_timeout: self.session_open_timeout,
            tool_call_timeout: self.tool_call_timeout,
        }
    }
}

fn parse_positive(variable: &'static str, raw: &str) -> ConfigResult<u32> {
    raw.parse::<u32>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| ConfigError::Invalid {
            variable,
            value: raw.to_owned(),
            expected: "a positive integer",
        })
}

fn parse_flag(variable: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            variable,
            value: raw.to_owned(),
            expected: "a boolean",
        }),
    }
}
