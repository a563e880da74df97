//! Validation errors for access-control domain types.

use crate::error::GatewayErrorKind;
use thiserror::Error;

/// Errors raised while constructing access-control values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessDomainError {
    /// Client names may not be empty.
    #[error("client name must not be empty")]
    EmptyClientName,

    /// Client name contains characters outside the naming policy.
    #[error("client name '{0}' may only contain ASCII letters, digits, '_' and '-'")]
    InvalidClientName(String),

    /// Client name exceeds the storage limit.
    #[error("client name '{0}' exceeds 100 characters")]
    ClientNameTooLong(String),

    /// Usernames may not be empty.
    #[error("username must not be empty")]
    EmptyUsername,

    /// An access token may not be empty.
    #[error("access token must not be empty")]
    EmptyAccessToken,

    /// The server mode is not recognised.
    #[error("unknown server mode '{0}', expected 'dev' or 'prod'")]
    UnknownServerMode(String),

    /// The user role is not recognised.
    #[error("unknown user role '{0}'")]
    UnknownUserRole(String),

    /// An allow-list entry is not a valid server name.
    #[error("allow-list entry '{0}' is not a valid server name")]
    InvalidAllowListEntry(String),
}

impl AccessDomainError {
    /// Classifies the error for callers.
    #[must_use]
    pub const fn kind(&self) -> GatewayErrorKind {
        match self {
            Self::EmptyClientName
            | Self::InvalidClientName(_)
            | Self::ClientNameTooLong(_)
            | Self::EmptyUsername
            | Self::InvalidAllowListEntry(_) => GatewayErrorKind::InvalidName,
            Self::EmptyAccessToken => GatewayErrorKind::Unauthenticated,
            Self::UnknownServerMode(_) | Self::UnknownUserRole(_) => GatewayErrorKind::InvalidConfig,
        }
    }
}
