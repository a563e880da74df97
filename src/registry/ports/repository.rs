//! Repository port for the backend server and tool catalog.

use crate::registry::domain::{
    CatalogTool, McpServer, McpServerId, McpServerName, QualifiedToolName, ToolId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for catalog repository operations.
pub type McpCatalogResult<T> = Result<T, McpCatalogError>;

/// Persistence contract for backend servers and their tools.
///
/// Implementations enforce three uniqueness invariants atomically: server id,
/// server name, and tool name within a server. No caching is allowed; every
/// read reflects the latest committed state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait McpCatalogRepository: Send + Sync {
    /// Stores a new server.
    ///
    /// # Errors
    ///
    /// Returns [`McpCatalogError::DuplicateServerName`] when the name is taken.
    async fn insert_server(&self, server: &McpServer) -> McpCatalogResult<()>;

    /// Finds a server by its unique name.
    async fn find_server_by_name(
        &self,
        server_name: &McpServerName,
    ) -> McpCatalogResult<Option<McpServer>>;

    /// Returns every registered server ordered by name.
    async fn list_servers(&self) -> McpCatalogResult<Vec<McpServer>>;

    /// Stores a new tool for an existing server.
    ///
    /// # Errors
    ///
    /// Returns [`McpCatalogError::DuplicateTool`] when the server already has
    /// a tool with the same name, or [`McpCatalogError::ServerNotFound`] when
    /// the owning server is gone.
    async fn insert_tool(&self, tool: &CatalogTool) -> McpCatalogResult<()>;

    /// Persists the mutable fields (enabled flag, timestamps) of a tool.
    ///
    /// # Errors
    ///
    /// Returns [`McpCatalogError::ToolNotFound`] when the tool does not exist.
    async fn update_tool(&self, tool: &CatalogTool) -> McpCatalogResult<()>;

    /// Persists the mutable fields of several tools as one unit.
    ///
    /// Either every tool is updated or none is.
    ///
    /// # Errors
    ///
    /// Returns [`McpCatalogError::ToolNotFound`] when any tool does not
    /// exist; nothing is updated in that case.
    async fn update_tools(&self, tools: &[CatalogTool]) -> McpCatalogResult<()>;

    /// Deletes a single tool.
    ///
    /// # Errors
    ///
    /// Returns [`McpCatalogError::ToolNotFound`] when the tool does not exist.
    async fn delete_tool(&self, tool_id: ToolId) -> McpCatalogResult<()>;

    /// Finds a tool by its qualified name.
    async fn find_tool(&self, name: &QualifiedToolName) -> McpCatalogResult<Option<CatalogTool>>;

    /// Returns every tool ordered by qualified name.
    async fn list_tools(&self) -> McpCatalogResult<Vec<CatalogTool>>;

    /// Returns the tools of one server ordered by name.
    async fn list_tools_for_server(
        &self,
        server_name: &McpServerName,
    ) -> McpCatalogResult<Vec<CatalogTool>>;

    /// Deletes every tool owned by a server, then the server itself.
    ///
    /// Tools are removed one at a time; the first failure aborts the whole
    /// operation and leaves the server and all of its tools unchanged.
    /// Returns the removed tools.
    ///
    /// # Errors
    ///
    /// Returns [`McpCatalogError::ServerNotFound`] when the server is absent,
    /// or the failure that aborted the removal.
    async fn remove_server(&self, server_id: McpServerId) -> McpCatalogResult<Vec<CatalogTool>>;
}

/// Errors returned by catalog repository implementations.
#[derive(Debug, Clone, Error)]
pub enum McpCatalogError {
    /// A server with the same identifier already exists.
    #[error("duplicate MCP server identifier: {0}")]
    DuplicateServer(McpServerId),

    /// A server with the same name already exists.
    #[error("MCP server '{0}' is already registered")]
    DuplicateServerName(McpServerName),

    /// The server already exposes a tool with the same name.
    #[error("tool '{0}' is already catalogued")]
    DuplicateTool(QualifiedToolName),

    /// The server was not found.
    #[error("MCP server not found: {0}")]
    ServerNotFound(McpServerId),

    /// The tool was not found.
    #[error("tool not found: {0}")]
    ToolNotFound(ToolId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted catalog data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl McpCatalogError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns whether the error is a uniqueness violation.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateServer(_) | Self::DuplicateServerName(_) | Self::DuplicateTool(_)
        )
    }
}
