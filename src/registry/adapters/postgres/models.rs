//! Diesel row models for catalog persistence.

use super::schema::{mcp_servers, mcp_tools};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for backend servers.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mcp_servers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct McpServerRow {
    /// Internal server identifier.
    pub id: uuid::Uuid,
    /// Unique server name.
    pub name: String,
    /// Human description.
    pub description: String,
    /// Transport configuration payload.
    pub transport: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for backend servers.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mcp_servers)]
pub struct NewMcpServerRow {
    /// Internal server identifier.
    pub id: uuid::Uuid,
    /// Unique server name.
    pub name: String,
    /// Human description.
    pub description: String,
    /// Transport configuration payload.
    pub transport: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for catalogued tools.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = mcp_tools)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct McpToolRow {
    /// Internal tool identifier.
    pub id: uuid::Uuid,
    /// Owning server identifier.
    pub server_id: uuid::Uuid,
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Opaque input schema.
    pub input_schema: Value,
    /// Enabled flag.
    pub enabled: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for catalogued tools.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mcp_tools)]
pub struct NewMcpToolRow {
    /// Internal tool identifier.
    pub id: uuid::Uuid,
    /// Owning server identifier.
    pub server_id: uuid::Uuid,
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Opaque input schema.
    pub input_schema: Value,
    /// Enabled flag.
    pub enabled: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
