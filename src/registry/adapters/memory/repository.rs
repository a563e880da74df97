//! In-memory repository for the server and tool catalog.

use crate::registry::{
    domain::{CatalogTool, McpServer, McpServerId, McpServerName, QualifiedToolName, ToolId},
    ports::{McpCatalogError, McpCatalogRepository, McpCatalogResult},
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory catalog repository.
///
/// Unique indexes are checked and updated under a single write lock, which
/// gives the same insert-or-conflict atomicity as database constraints.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMcpCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    servers: HashMap<McpServerId, McpServer>,
    server_names: HashMap<McpServerName, McpServerId>,
    tools: HashMap<ToolId, CatalogTool>,
    tool_names: HashMap<QualifiedToolName, ToolId>,
    failing_inserts: HashSet<QualifiedToolName>,
    failing_deletes: HashSet<QualifiedToolName>,
    failing_updates: HashSet<QualifiedToolName>,
}

impl InMemoryMcpCatalog {
    /// Creates an empty in-memory catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert of `tool` fail with a persistence error.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn fail_tool_insert(&self, tool: QualifiedToolName) -> McpCatalogResult<()> {
        self.write()?.failing_inserts.insert(tool);
        Ok(())
    }

    /// Makes every subsequent delete of `tool` fail with a persistence error.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn fail_tool_delete(&self, tool: QualifiedToolName) -> McpCatalogResult<()> {
        self.write()?.failing_deletes.insert(tool);
        Ok(())
    }

    /// Makes every subsequent update of `tool` fail with a persistence error.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn fail_tool_update(&self, tool: QualifiedToolName) -> McpCatalogResult<()> {
        self.write()?.failing_updates.insert(tool);
        Ok(())
    }

    fn read(&self) -> McpCatalogResult<std::sync::RwLockReadGuard<'_, InMemoryCatalogState>> {
        self.state
            .read()
            .map_err(|err| McpCatalogError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> McpCatalogResult<std::sync::RwLockWriteGuard<'_, InMemoryCatalogState>> {
        self.state
            .write()
            .map_err(|err| McpCatalogError::persistence(std::io::Error::other(err.to_string())))
    }
}

fn injected_failure(operation: &str, tool: &QualifiedToolName) -> McpCatalogError {
    McpCatalogError::persistence(std::io::Error::other(format!(
        "injected {operation} failure for tool {tool}"
    )))
}

fn sorted_by_name(mut tools: Vec<CatalogTool>) -> Vec<CatalogTool> {
    tools.sort_by(|left, right| left.qualified_name().cmp(right.qualified_name()));
    tools
}

#[async_trait]
impl McpCatalogRepository for InMemoryMcpCatalog {
    async fn insert_server(&self, server: &McpServer) -> McpCatalogResult<()> {
        let mut state = self.write()?;

        if state.servers.contains_key(&server.id()) {
            return Err(McpCatalogError::DuplicateServer(server.id()));
        }

        if state.server_names.contains_key(server.name()) {
            return Err(McpCatalogError::DuplicateServerName(server.name().clone()));
        }

        state.server_names.insert(server.name().clone(), server.id());
        state.servers.insert(server.id(), server.clone());
        Ok(())
    }

    async fn find_server_by_name(
        &self,
        server_name: &McpServerName,
    ) -> McpCatalogResult<Option<McpServer>> {
        let state = self.read()?;
        Ok(state
            .server_names
            .get(server_name)
            .and_then(|id| state.servers.get(id))
            .cloned())
    }

    async fn list_servers(&self) -> McpCatalogResult<Vec<McpServer>> {
        let state = self.read()?;
        let mut servers: Vec<McpServer> = state.servers.values().cloned().collect();
        servers.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(servers)
    }

    async fn insert_tool(&self, tool: &CatalogTool) -> McpCatalogResult<()> {
        let mut state = self.write()?;

        if state.failing_inserts.contains(tool.qualified_name()) {
            return Err(injected_failure("insert", tool.qualified_name()));
        }

        if !state.servers.contains_key(&tool.server_id()) {
            return Err(McpCatalogError::ServerNotFound(tool.server_id()));
        }

        if state.tool_names.contains_key(tool.qualified_name()) {
            return Err(McpCatalogError::DuplicateTool(tool.qualified_name().clone()));
        }

        state
            .tool_names
            .insert(tool.qualified_name().clone(), tool.id());
        state.tools.insert(tool.id(), tool.clone());
        Ok(())
    }

    async fn update_tool(&self, tool: &CatalogTool) -> McpCatalogResult<()> {
        self.update_tools(std::slice::from_ref(tool)).await
    }

    async fn update_tools(&self, tools: &[CatalogTool]) -> McpCatalogResult<()> {
        let mut state = self.write()?;
        for tool in tools {
            if !state.tools.contains_key(&tool.id()) {
                return Err(McpCatalogError::ToolNotFound(tool.id()));
            }
            if state.failing_updates.contains(tool.qualified_name()) {
                return Err(injected_failure("update", tool.qualified_name()));
            }
        }
        for tool in tools {
            state.tools.insert(tool.id(), tool.clone());
        }
        Ok(())
    }

    async fn delete_tool(&self, tool_id: ToolId) -> McpCatalogResult<()> {
        let mut state = self.write()?;
        let name = state
            .tools
            .get(&tool_id)
            .ok_or(McpCatalogError::ToolNotFound(tool_id))?
            .qualified_name()
            .clone();

        if state.failing_deletes.contains(&name) {
            return Err(injected_failure("delete", &name));
        }

        state.tool_names.remove(&name);
        state.tools.remove(&tool_id);
        Ok(())
    }

    async fn find_tool(&self, name: &QualifiedToolName) -> McpCatalogResult<Option<CatalogTool>> {
        let state = self.read()?;
        Ok(state
            .tool_names
            .get(name)
            .and_then(|id| state.tools.get(id))
            .cloned())
    }

    async fn list_tools(&self) -> McpCatalogResult<Vec<CatalogTool>> {
        let state = self.read()?;
        Ok(sorted_by_name(state.tools.values().cloned().collect()))
    }

    async fn list_tools_for_server(
        &self,
        server_name: &McpServerName,
    ) -> McpCatalogResult<Vec<CatalogTool>> {
        let state = self.read()?;
        Ok(sorted_by_name(
            state
                .tools
                .values()
                .filter(|tool| tool.server_name() == server_name)
                .cloned()
                .collect(),
        ))
    }

    async fn remove_server(&self, server_id: McpServerId) -> McpCatalogResult<Vec<CatalogTool>> {
        let mut state = self.write()?;

        let server_name = state
            .servers
            .get(&server_id)
            .ok_or(McpCatalogError::ServerNotFound(server_id))?
            .name()
            .clone();

        let owned = sorted_by_name(
            state
                .tools
                .values()
                .filter(|tool| tool.server_id() == server_id)
                .cloned()
                .collect(),
        );

        // Nothing is mutated until every deletion is known to succeed.
        if let Some(blocked) = owned
            .iter()
            .find(|tool| state.failing_deletes.contains(tool.qualified_name()))
        {
            return Err(injected_failure("delete", blocked.qualified_name()));
        }

        for tool in &owned {
            state.tool_names.remove(tool.qualified_name());
            state.tools.remove(&tool.id());
        }
        state.server_names.remove(&server_name);
        state.servers.remove(&server_id);
        Ok(owned)
    }
}
