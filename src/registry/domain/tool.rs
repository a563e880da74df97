//! Tool descriptors reported by backends and their catalog records.

use super::{McpServer, McpServerId, McpServerName, QualifiedToolName, RegistryDomainError, ToolId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool metadata exactly as a backend server reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpToolDefinition {
    name: String,
    description: String,
    input_schema: Value,
}

impl McpToolDefinition {
    /// Creates a tool descriptor.
    ///
    /// Nothing is validated or normalized here; the catalog decides whether
    /// a reported name can be stored when the tool is discovered.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }
}

/// A catalogued tool owned by exactly one backend server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTool {
    id: ToolId,
    server_id: McpServerId,
    qualified_name: QualifiedToolName,
    description: String,
    input_schema: Value,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted catalog tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedCatalogToolData {
    /// Persisted tool identifier.
    pub id: ToolId,
    /// Owning server identifier.
    pub server_id: McpServerId,
    /// Owning server name.
    pub server_name: McpServerName,
    /// Tool name as reported by the backend.
    pub name: String,
    /// Persisted description.
    pub description: String,
    /// Persisted input schema.
    pub input_schema: Value,
    /// Persisted enabled flag.
    pub enabled: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl CatalogTool {
    /// Catalogs a discovered tool for `server`, enabled.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyToolName`] when the backend
    /// reported an empty name.
    pub fn discovered(
        server: &McpServer,
        definition: McpToolDefinition,
        clock: &impl Clock,
    ) -> Result<Self, RegistryDomainError> {
        let timestamp = clock.utc();
        let McpToolDefinition {
            name,
            description,
            input_schema,
        } = definition;
        Ok(Self {
            id: ToolId::new(),
            server_id: server.id(),
            qualified_name: QualifiedToolName::new(server.name().clone(), name)?,
            description,
            input_schema,
            enabled: true,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a tool from persistence.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyToolName`] when the stored name is
    /// empty.
    pub fn from_persisted(data: PersistedCatalogToolData) -> Result<Self, RegistryDomainError> {
        Ok(Self {
            id: data.id,
            server_id: data.server_id,
            qualified_name: QualifiedToolName::new(data.server_name, data.name)?,
            description: data.description,
            input_schema: data.input_schema,
            enabled: data.enabled,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Returns the tool identifier.
    #[must_use]
    pub const fn id(&self) -> ToolId {
        self.id
    }

    /// Returns the owning server identifier.
    #[must_use]
    pub const fn server_id(&self) -> McpServerId {
        self.server_id
    }

    /// Returns the owning server name.
    #[must_use]
    pub const fn server_name(&self) -> &McpServerName {
        self.qualified_name.server()
    }

    /// Returns the tool name as reported by the backend.
    #[must_use]
    pub fn name(&self) -> &str {
        self.qualified_name.tool()
    }

    /// Returns the externally visible `<server>.<tool>` identifier.
    #[must_use]
    pub const fn qualified_name(&self) -> &QualifiedToolName {
        &self.qualified_name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the opaque input schema.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns whether the tool may be invoked.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
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

    /// Replaces the backend-reported description and schema.
    ///
    /// The enabled flag is left untouched.
    pub fn refresh_metadata(&mut self, description: &str, input_schema: &Value, clock: &impl Clock) {
        if self.description == description && &self.input_schema == input_schema {
            return;
        }
        description.clone_into(&mut self.description);
        self.input_schema = input_schema.clone();
        self.updated_at = clock.utc();
    }

    /// Sets the enabled flag, returning whether it changed.
    pub fn set_enabled(&mut self, enabled: bool, clock: &impl Clock) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        self.updated_at = clock.utc();
        true
    }
}
