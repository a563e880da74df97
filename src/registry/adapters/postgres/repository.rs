//! `PostgreSQL` repository implementation for the server and tool catalog.

use super::{
    models::{McpServerRow, McpToolRow, NewMcpServerRow, NewMcpToolRow},
    schema::{mcp_servers, mcp_tools},
};
use crate::registry::{
    domain::{
        CatalogTool, McpServer, McpServerId, McpServerName, McpTransport,
        PersistedCatalogToolData, PersistedMcpServerData, QualifiedToolName, ToolId,
    },
    ports::{McpCatalogError, McpCatalogRepository, McpCatalogResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by the catalog adapter.
pub type McpCatalogPgPool = Pool<ConnectionManager<PgConnection>>;

const SERVER_NAME_INDEX: &str = "idx_mcp_servers_name";
const TOOL_NAME_INDEX: &str = "idx_mcp_tools_server_name";

/// Mutable tool columns captured for an update.
struct ToolChange {
    id: ToolId,
    enabled: bool,
    description: String,
    input_schema: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl From<&CatalogTool> for ToolChange {
    fn from(tool: &CatalogTool) -> Self {
        Self {
            id: tool.id(),
            enabled: tool.is_enabled(),
            description: tool.description().to_owned(),
            input_schema: tool.input_schema().clone(),
            updated_at: tool.updated_at(),
        }
    }
}

/// `PostgreSQL`-backed catalog repository.
#[derive(Debug, Clone)]
pub struct PostgresMcpCatalog {
    pool: McpCatalogPgPool,
}

impl PostgresMcpCatalog {
    /// Creates a repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: McpCatalogPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> McpCatalogResult<T>
    where
        F: FnOnce(&mut PgConnection) -> McpCatalogResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(McpCatalogError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(McpCatalogError::persistence)?
    }
}

impl From<DieselError> for McpCatalogError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl McpCatalogRepository for PostgresMcpCatalog {
    async fn insert_server(&self, server: &McpServer) -> McpCatalogResult<()> {
        let server_id = server.id();
        let server_name = server.name().clone();
        let new_row = to_new_server_row(server)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(mcp_servers::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if violates(info.as_ref(), SERVER_NAME_INDEX) =>
                    {
                        McpCatalogError::DuplicateServerName(server_name.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        McpCatalogError::DuplicateServer(server_id)
                    }
                    _ => McpCatalogError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_server_by_name(
        &self,
        server_name: &McpServerName,
    ) -> McpCatalogResult<Option<McpServer>> {
        let name = server_name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = mcp_servers::table
                .filter(mcp_servers::name.eq(&name))
                .select(McpServerRow::as_select())
                .first::<McpServerRow>(connection)
                .optional()?;
            row.map(row_to_server).transpose()
        })
        .await
    }

    async fn list_servers(&self) -> McpCatalogResult<Vec<McpServer>> {
        self.run_blocking(move |connection| {
            let rows = mcp_servers::table
                .select(McpServerRow::as_select())
                .load::<McpServerRow>(connection)?;
            let mut servers = rows
                .into_iter()
                .map(row_to_server)
                .collect::<McpCatalogResult<Vec<_>>>()?;
            servers.sort_by(|left, right| left.name().cmp(right.name()));
            Ok(servers)
        })
        .await
    }

    async fn insert_tool(&self, tool: &CatalogTool) -> McpCatalogResult<()> {
        let qualified_name = tool.qualified_name().clone();
        let server_id = tool.server_id();
        let new_row = to_new_tool_row(tool);

        self.run_blocking(move |connection| {
            diesel::insert_into(mcp_tools::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if violates(info.as_ref(), TOOL_NAME_INDEX) =>
                    {
                        McpCatalogError::DuplicateTool(qualified_name.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        McpCatalogError::ServerNotFound(server_id)
                    }
                    _ => McpCatalogError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_tool(&self, tool: &CatalogTool) -> McpCatalogResult<()> {
        self.update_tools(std::slice::from_ref(tool)).await
    }

    async fn update_tools(&self, tools: &[CatalogTool]) -> McpCatalogResult<()> {
        let changes: Vec<ToolChange> = tools.iter().map(ToolChange::from).collect();

        self.run_blocking(move |connection| {
            connection.transaction::<_, McpCatalogError, _>(|tx| {
                for change in &changes {
                    let updated_count = diesel::update(
                        mcp_tools::table.filter(mcp_tools::id.eq(change.id.into_inner())),
                    )
                    .set((
                        mcp_tools::enabled.eq(change.enabled),
                        mcp_tools::description.eq(&change.description),
                        mcp_tools::input_schema.eq(&change.input_schema),
                        mcp_tools::updated_at.eq(change.updated_at),
                    ))
                    .execute(tx)?;

                    if updated_count == 0 {
                        return Err(McpCatalogError::ToolNotFound(change.id));
                    }
                }
                Ok(())
            })
        })
        .await
    }

    async fn delete_tool(&self, tool_id: ToolId) -> McpCatalogResult<()> {
        self.run_blocking(move |connection| {
            let deleted =
                diesel::delete(mcp_tools::table.filter(mcp_tools::id.eq(tool_id.into_inner())))
                    .execute(connection)?;
            if deleted == 0 {
                return Err(McpCatalogError::ToolNotFound(tool_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_tool(&self, name: &QualifiedToolName) -> McpCatalogResult<Option<CatalogTool>> {
        let server_name = name.server().as_str().to_owned();
        let tool_name = name.tool().to_owned();
        self.run_blocking(move |connection| {
            let row = mcp_tools::table
                .inner_join(mcp_servers::table)
                .filter(mcp_servers::name.eq(&server_name))
                .filter(mcp_tools::name.eq(&tool_name))
                .select((McpToolRow::as_select(), mcp_servers::name))
                .first::<(McpToolRow, String)>(connection)
                .optional()?;
            row.map(row_to_tool).transpose()
        })
        .await
    }

    async fn list_tools(&self) -> McpCatalogResult<Vec<CatalogTool>> {
        self.run_blocking(move |connection| {
            let rows = mcp_tools::table
                .inner_join(mcp_servers::table)
                .select((McpToolRow::as_select(), mcp_servers::name))
                .load::<(McpToolRow, String)>(connection)?;
            rows_to_sorted_tools(rows)
        })
        .await
    }

    async fn list_tools_for_server(
        &self,
        server_name: &McpServerName,
    ) -> McpCatalogResult<Vec<CatalogTool>> {
        let name = server_name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = mcp_tools::table
                .inner_join(mcp_servers::table)
                .filter(mcp_servers::name.eq(&name))
                .select((McpToolRow::as_select(), mcp_servers::name))
                .load::<(McpToolRow, String)>(connection)?;
            rows_to_sorted_tools(rows)
        })
        .await
    }

    async fn remove_server(&self, server_id: McpServerId) -> McpCatalogResult<Vec<CatalogTool>> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, McpCatalogError, _>(|tx| {
                let server_name = mcp_servers::table
                    .filter(mcp_servers::id.eq(server_id.into_inner()))
                    .select(mcp_servers::name)
                    .for_update()
                    .first::<String>(tx)
                    .optional()?
                    .ok_or(McpCatalogError::ServerNotFound(server_id))?;

                let rows = mcp_tools::table
                    .filter(mcp_tools::server_id.eq(server_id.into_inner()))
                    .select(McpToolRow::as_select())
                    .load::<McpToolRow>(tx)?;
                let removed = rows_to_sorted_tools(
                    rows.into_iter()
                        .map(|row| (row, server_name.clone()))
                        .collect(),
                )?;

                for tool in &removed {
                    let deleted = diesel::delete(
                        mcp_tools::table.filter(mcp_tools::id.eq(tool.id().into_inner())),
                    )
                    .execute(tx)?;
                    if deleted == 0 {
                        return Err(McpCatalogError::ToolNotFound(tool.id()));
                    }
                }

                diesel::delete(mcp_servers::table.filter(mcp_servers::id.eq(server_id.into_inner())))
                    .execute(tx)?;
                Ok(removed)
            })
        })
        .await
    }
}

fn to_new_server_row(server: &McpServer) -> McpCatalogResult<NewMcpServerRow> {
    let transport =
        serde_json::to_value(server.transport()).map_err(McpCatalogError::persistence)?;
    Ok(NewMcpServerRow {
        id: server.id().into_inner(),
        name: server.name().as_str().to_owned(),
        description: server.description().to_owned(),
        transport,
        created_at: server.created_at(),
        updated_at: server.updated_at(),
    })
}

fn to_new_tool_row(tool: &CatalogTool) -> NewMcpToolRow {
    NewMcpToolRow {
        id: tool.id().into_inner(),
        server_id: tool.server_id().into_inner(),
        name: tool.name().to_owned(),
        description: tool.description().to_owned(),
        input_schema: tool.input_schema().clone(),
        enabled: tool.is_enabled(),
        created_at: tool.created_at(),
        updated_at: tool.updated_at(),
    }
}

fn row_to_server(row: McpServerRow) -> McpCatalogResult<McpServer> {
    let McpServerRow {
        id,
        name,
        description,
        transport,
        created_at,
        updated_at,
    } = row;

    let parsed_name = McpServerName::new(name).map_err(McpCatalogError::invalid_persisted_data)?;
    let parsed_transport: McpTransport =
        serde_json::from_value(transport).map_err(McpCatalogError::invalid_persisted_data)?;

    Ok(McpServer::from_persisted(PersistedMcpServerData {
        id: McpServerId::from_uuid(id),
        name: parsed_name,
        description,
        transport: parsed_transport,
        created_at,
        updated_at,
    }))
}

fn row_to_tool((row, server_name): (McpToolRow, String)) -> McpCatalogResult<CatalogTool> {
    let parsed_server_name =
        McpServerName::new(server_name).map_err(McpCatalogError::invalid_persisted_data)?;
    CatalogTool::from_persisted(PersistedCatalogToolData {
        id: ToolId::from_uuid(row.id),
        server_id: McpServerId::from_uuid(row.server_id),
        server_name: parsed_server_name,
        name: row.name,
        description: row.description,
        input_schema: row.input_schema,
        enabled: row.enabled,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
    .map_err(McpCatalogError::invalid_persisted_data)
}

fn rows_to_sorted_tools(rows: Vec<(McpToolRow, String)>) -> McpCatalogResult<Vec<CatalogTool>> {
    let mut tools = rows
        .into_iter()
        .map(row_to_tool)
        .collect::<McpCatalogResult<Vec<_>>>()?;
    tools.sort_by(|left, right| left.qualified_name().cmp(right.qualified_name()));
    Ok(tools)
}

fn violates(info: &dyn DatabaseErrorInformation, index: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == index)
}
