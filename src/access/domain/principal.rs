//! Resolved callers and the actions they request.

use super::{AdminUser, McpClient, ServerAccessPolicy};
use crate::registry::domain::McpServerName;
use serde::Serialize;
use std::fmt;

/// The caller behind a request, after credential resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// The local operator in development mode; no credential involved.
    Operator,
    /// An administrative user.
    Admin {
        /// The resolved user.
        user: AdminUser,
    },
    /// A scoped client.
    Client {
        /// The resolved client.
        client: McpClient,
    },
}

impl Principal {
    /// Returns whether the principal is restricted by an allow-list.
    #[must_use]
    pub const fn is_scoped(&self) -> bool {
        matches!(self, Self::Client { .. })
    }

    /// Returns a short label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Operator => "operator".to_owned(),
            Self::Admin { user } => format!("admin:{}", user.username()),
            Self::Client { client } => format!("client:{}", client.name()),
        }
    }
}

impl ServerAccessPolicy for Principal {
    fn has_access(&self, server: &McpServerName) -> bool {
        match self {
            Self::Operator | Self::Admin { .. } => true,
            Self::Client { client } => client.has_access(server),
        }
    }
}

/// An action subject to authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessAction {
    /// Register, deregister, or resync servers.
    ManageServers,
    /// List or inspect servers.
    ViewServers,
    /// Enable or disable tools.
    ManageTools,
    /// List tools; scoped principals see only what they may access.
    ListTools,
    /// Inspect or invoke tools of one server.
    UseServerTools(McpServerName),
    /// Create, list, or delete clients.
    ManageClients,
    /// Describe the calling principal.
    Identify,
}

impl fmt::Display for AccessAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManageServers => formatter.write_str("manage servers"),
            Self::ViewServers => formatter.write_str("view servers"),
            Self::ManageTools => formatter.write_str("manage tools"),
            Self::ListTools => formatter.write_str("list tools"),
            Self::UseServerTools(server) => write!(formatter, "use tools of server '{server}'"),
            Self::ManageClients => formatter.write_str("manage clients"),
            Self::Identify => formatter.write_str("identify"),
        }
    }
}
