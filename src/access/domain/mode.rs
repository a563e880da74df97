//! Server deployment mode and the singleton configuration record.

use super::AccessDomainError;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment mode fixed once at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    /// Single-operator development; no credentials are checked.
    Dev,
    /// Production; every action needs a bearer token.
    Prod,
}

impl ServerMode {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for ServerMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServerMode {
    type Error = AccessDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "prod" | "production" => Ok(Self::Prod),
            _ => Err(AccessDomainError::UnknownServerMode(value.to_owned())),
        }
    }
}

/// The singleton record written by initialization.
///
/// Its absence means the gateway is uninitialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfiguration {
    mode: ServerMode,
    initialized_at: DateTime<Utc>,
}

impl ServerConfiguration {
    /// Creates a configuration for `mode`, stamped now.
    #[must_use]
    pub fn new(mode: ServerMode, clock: &impl Clock) -> Self {
        Self {
            mode,
            initialized_at: clock.utc(),
        }
    }

    /// Reconstructs a configuration from persistence.
    #[must_use]
    pub const fn from_persisted(mode: ServerMode, initialized_at: DateTime<Utc>) -> Self {
        Self {
            mode,
            initialized_at,
        }
    }

    /// Returns the deployment mode.
    #[must_use]
    pub const fn mode(&self) -> ServerMode {
        self.mode
    }

    /// Returns when initialization happened.
    #[must_use]
    pub const fn initialized_at(&self) -> DateTime<Utc> {
        self.initialized_at
    }
}
