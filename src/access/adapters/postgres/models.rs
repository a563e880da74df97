//! Diesel row models for access-control persistence.

use super::schema::{admin_users, mcp_clients, server_config};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Row for the singleton server configuration.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = server_config)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServerConfigRow {
    /// Constant singleton key.
    pub id: i16,
    /// Deployment mode.
    pub mode: String,
    /// Initialization timestamp.
    pub initialized_at: DateTime<Utc>,
}

/// Row for administrative users.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = admin_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AdminUserRow {
    /// User identifier.
    pub id: uuid::Uuid,
    /// Unique username.
    pub username: String,
    /// Role.
    pub role: String,
    /// Bearer token.
    pub access_token: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row for scoped clients.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = mcp_clients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct McpClientRow {
    /// Client identifier.
    pub id: uuid::Uuid,
    /// Unique client name.
    pub name: String,
    /// Human description.
    pub description: String,
    /// Bearer token.
    pub access_token: String,
    /// Allowed server names.
    pub allow_list: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
