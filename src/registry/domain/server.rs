//! Backend server registration aggregate root.

use super::{McpServerId, McpServerName, McpTransport};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A registered backend server and its transport configuration.
///
/// The name is immutable after creation; there is intentionally no setter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServer {
    id: McpServerId,
    name: McpServerName,
    description: String,
    transport: McpTransport,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted server state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMcpServerData {
    /// Persisted server identifier.
    pub id: McpServerId,
    /// Persisted server name.
    pub name: McpServerName,
    /// Persisted description.
    pub description: String,
    /// Persisted transport settings.
    pub transport: McpTransport,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl McpServer {
    /// Creates a new server record.
    #[must_use]
    pub fn new(
        name: McpServerName,
        description: impl Into<String>,
        transport: McpTransport,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: McpServerId::new(),
            name,
            description: description.into().trim().to_owned(),
            transport,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a server from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedMcpServerData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            description: data.description,
            transport: data.transport,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> McpServerId {
        self.id
    }

    /// Returns the validated server name.
    #[must_use]
    pub const fn name(&self) -> &McpServerName {
        &self.name
    }

    /// Returns the human description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the transport settings.
    #[must_use]
    pub const fn transport(&self) -> &McpTransport {
        &self.transport
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
