//! Error classification shared by every gateway service.
//!
//! Each service keeps its own `thiserror` enum. Callers that need to decide
//! how to surface a failure (the request router, the command-line front end)
//! ask the error for its [`GatewayErrorKind`] instead of matching on the
//! individual enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-facing classification of a gateway failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorKind {
    /// A server, client, or tool name violates the naming policy.
    InvalidName,
    /// Transport or request configuration is missing or malformed.
    InvalidConfig,
    /// No credential was supplied, or it matched no principal.
    Unauthenticated,
    /// The principal is not permitted to perform the action.
    Forbidden,
    /// The addressed resource does not exist.
    NotFound,
    /// A uniqueness constraint rejected a create.
    Conflict,
    /// A session to the backend server could not be opened.
    BackendUnreachable,
    /// The addressed tool exists but is disabled.
    ToolDisabled,
    /// The backend reported a failure while executing a tool.
    InvocationFailed,
    /// Persistence or other internal failure.
    Internal,
}

impl GatewayErrorKind {
    /// Returns the canonical snake-case representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidName => "invalid_name",
            Self::InvalidConfig => "invalid_config",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::BackendUnreachable => "backend_unreachable",
            Self::ToolDisabled => "tool_disabled",
            Self::InvocationFailed => "invocation_failed",
            Self::Internal => "internal",
        }
    }

    /// Returns the HTTP status code a request router should answer with.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidName | Self::InvalidConfig => 400,
            Self::Unauthenticated => 401,
            Self::Forbidden | Self::ToolDisabled => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::BackendUnreachable | Self::InvocationFailed | Self::Internal => 500,
        }
    }

    /// Returns whether the failure details may be shown to the caller.
    ///
    /// Internal failures are logged but reported only generically.
    #[must_use]
    pub const fn is_public(self) -> bool {
        !matches!(self, Self::Internal)
    }
}

impl fmt::Display for GatewayErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
