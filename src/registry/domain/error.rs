//! Error types for registry domain validation and parsing.

use crate::error::GatewayErrorKind;
use thiserror::Error;

/// Errors returned while constructing registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryDomainError {
    /// The server name is empty after trimming.
    #[error("MCP server name must not be empty")]
    EmptyServerName,

    /// The server name contains characters outside `[A-Za-z0-9_-]`.
    #[error(
        "MCP server name '{0}' contains invalid characters (only ASCII letters, digits, '_' and '-' allowed)"
    )]
    InvalidServerName(String),

    /// The server name exceeds the 100-character storage limit.
    #[error("MCP server name exceeds 100 character limit: {0}")]
    ServerNameTooLong(String),

    /// A qualified tool name does not have the `<server>.<tool>` shape.
    #[error("'{0}' is not a qualified tool name (expected '<server>.<tool>')")]
    MalformedQualifiedToolName(String),

    /// A reported tool name is empty.
    #[error("tool name must not be empty")]
    EmptyToolName,

    /// The transport kind is not one of the supported variants.
    #[error("unsupported transport '{0}' (expected 'subprocess' or 'streamable_http')")]
    UnknownTransport(String),

    /// The subprocess command is missing or empty.
    #[error("subprocess transport requires a command")]
    EmptySubprocessCommand,

    /// The streamable HTTP URL is missing or empty.
    #[error("streamable_http transport requires a url")]
    EmptyHttpUrl,

    /// The streamable HTTP URL does not have an `http://` or `https://` prefix.
    #[error("streamable_http url '{0}' must start with 'http://' or 'https://'")]
    InvalidHttpUrl(String),

    /// The bearer credential is present but empty after trimming.
    #[error("bearer token must not be empty when provided")]
    EmptyBearerToken,
}

impl RegistryDomainError {
    /// Classifies the validation failure.
    #[must_use]
    pub const fn kind(&self) -> GatewayErrorKind {
        match self {
            Self::EmptyServerName
            | Self::InvalidServerName(_)
            | Self::ServerNameTooLong(_)
            | Self::MalformedQualifiedToolName(_)
            | Self::EmptyToolName => GatewayErrorKind::InvalidName,
            Self::UnknownTransport(_)
            | Self::EmptySubprocessCommand
            | Self::EmptyHttpUrl
            | Self::InvalidHttpUrl(_)
            | Self::EmptyBearerToken => GatewayErrorKind::InvalidConfig,
        }
    }
}
