//! `PostgreSQL` implementation of every access repository port.

use super::{
    models::{AdminUserRow, McpClientRow, ServerConfigRow},
    schema::{admin_users, mcp_clients, server_config},
};
use crate::access::{
    domain::{
        AccessToken, AdminUser, AllowList, ClientName, McpClient, PersistedAdminUserData,
        PersistedMcpClientData, ServerConfiguration, ServerMode, UserRole,
    },
    ports::{
        AccessRepositoryError, AccessRepositoryResult, AdminUserRepository, ClientRepository,
        ServerConfigRepository,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by the access store.
pub type AccessPgPool = Pool<ConnectionManager<PgConnection>>;

const SINGLETON_CONFIG_ID: i16 = 1;
const CLIENT_NAME_INDEX: &str = "idx_mcp_clients_name";

/// `PostgreSQL`-backed access store.
#[derive(Debug, Clone)]
pub struct PostgresAccessStore {
    pool: AccessPgPool,
}

impl PostgresAccessStore {
    /// Creates a store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: AccessPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> AccessRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AccessRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(AccessRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(AccessRepositoryError::persistence)?
    }
}

impl From<DieselError> for AccessRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl ServerConfigRepository for PostgresAccessStore {
    async fn load_config(&self) -> AccessRepositoryResult<Option<ServerConfiguration>> {
        self.run_blocking(|connection| {
            let row = server_config::table
                .filter(server_config::id.eq(SINGLETON_CONFIG_ID))
                .select(ServerConfigRow::as_select())
                .first::<ServerConfigRow>(connection)
                .optional()?;
            row.map(|config| {
                let mode = ServerMode::try_from(config.mode.as_str())
                    .map_err(AccessRepositoryError::invalid_persisted_data)?;
                Ok(ServerConfiguration::from_persisted(
                    mode,
                    config.initialized_at,
                ))
            })
            .transpose()
        })
        .await
    }

    async fn initialize(
        &self,
        config: &ServerConfiguration,
        admin: Option<&AdminUser>,
    ) -> AccessRepositoryResult<bool> {
        let config_row = ServerConfigRow {
            id: SINGLETON_CONFIG_ID,
            mode: config.mode().as_str().to_owned(),
            initialized_at: config.initialized_at(),
        };
        let admin_row = admin.map(to_admin_row);

        self.run_blocking(move |connection| {
            connection.transaction::<_, AccessRepositoryError, _>(|tx| {
                let inserted = diesel::insert_into(server_config::table)
                    .values(&config_row)
                    .on_conflict_do_nothing()
                    .execute(tx)?;
                if inserted == 0 {
                    return Ok(false);
                }
                if let Some(row) = &admin_row {
                    diesel::insert_into(admin_users::table)
                        .values(row)
                        .execute(tx)
                        .map_err(|err| match err {
                            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                                AccessRepositoryError::DuplicateToken
                            }
                            other => AccessRepositoryError::persistence(other),
                        })?;
                }
                Ok(true)
            })
        })
        .await
    }
}

#[async_trait]
impl AdminUserRepository for PostgresAccessStore {
    async fn find_admin_by_token(
        &self,
        token: &AccessToken,
    ) -> AccessRepositoryResult<Option<AdminUser>> {
        let secret = token.expose().to_owned();
        self.run_blocking(move |connection| {
            let row = admin_users::table
                .filter(admin_users::access_token.eq(&secret))
                .select(AdminUserRow::as_select())
                .first::<AdminUserRow>(connection)
                .optional()?;
            row.map(row_to_admin).transpose()
        })
        .await
    }
}

#[async_trait]
impl ClientRepository for PostgresAccessStore {
    async fn insert_client(&self, client: &McpClient) -> AccessRepositoryResult<()> {
        let client_name = client.name().clone();
        let row = to_client_row(client)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(mcp_clients::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if violates(info.as_ref(), CLIENT_NAME_INDEX) =>
                    {
                        AccessRepositoryError::DuplicateClientName(client_name.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        AccessRepositoryError::DuplicateToken
                    }
                    _ => AccessRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_client_by_name(
        &self,
        name: &ClientName,
    ) -> AccessRepositoryResult<Option<McpClient>> {
        let raw_name = name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = mcp_clients::table
                .filter(mcp_clients::name.eq(&raw_name))
                .select(McpClientRow::as_select())
                .first::<McpClientRow>(connection)
                .optional()?;
            row.map(row_to_client).transpose()
        })
        .await
    }

    async fn find_client_by_token(
        &self,
        token: &AccessToken,
    ) -> AccessRepositoryResult<Option<McpClient>> {
        let secret = token.expose().to_owned();
        self.run_blocking(move |connection| {
            let row = mcp_clients::table
                .filter(mcp_clients::access_token.eq(&secret))
                .select(McpClientRow::as_select())
                .first::<McpClientRow>(connection)
                .optional()?;
            row.map(row_to_client).transpose()
        })
        .await
    }

    async fn list_clients(&self) -> AccessRepositoryResult<Vec<McpClient>> {
        self.run_blocking(|connection| {
            let rows = mcp_clients::table
                .select(McpClientRow::as_select())
                .load::<McpClientRow>(connection)?;
            let mut clients = rows
                .into_iter()
                .map(row_to_client)
                .collect::<AccessRepositoryResult<Vec<_>>>()?;
            clients.sort_by(|left, right| left.name().cmp(right.name()));
            Ok(clients)
        })
        .await
    }

    async fn delete_client(&self, name: &ClientName) -> AccessRepositoryResult<()> {
        let client_name = name.clone();
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                mcp_clients::table.filter(mcp_clients::name.eq(client_name.as_str())),
            )
            .execute(connection)?;
            if deleted == 0 {
                return Err(AccessRepositoryError::ClientNotFound(client_name));
            }
            Ok(())
        })
        .await
    }
}

fn to_admin_row(user: &AdminUser) -> AdminUserRow {
    AdminUserRow {
        id: user.id(),
        username: user.username().to_owned(),
        role: user.role().as_str().to_owned(),
        access_token: user.access_token().expose().to_owned(),
        created_at: user.created_at(),
    }
}

fn row_to_admin(row: AdminUserRow) -> AccessRepositoryResult<AdminUser> {
    let role =
        UserRole::try_from(row.role.as_str()).map_err(AccessRepositoryError::invalid_persisted_data)?;
    let access_token =
        AccessToken::new(row.access_token).map_err(AccessRepositoryError::invalid_persisted_data)?;
    Ok(AdminUser::from_persisted(PersistedAdminUserData {
        id: row.id,
        username: row.username,
        role,
        access_token,
        created_at: row.created_at,
    }))
}

fn to_client_row(client: &McpClient) -> AccessRepositoryResult<McpClientRow> {
    let allow_list =
        serde_json::to_value(client.allow_list()).map_err(AccessRepositoryError::persistence)?;
    Ok(McpClientRow {
        id: client.id(),
        name: client.name().as_str().to_owned(),
        description: client.description().to_owned(),
        access_token: client.access_token().expose().to_owned(),
        allow_list,
        created_at: client.created_at(),
    })
}

fn row_to_client(row: McpClientRow) -> AccessRepositoryResult<McpClient> {
    let McpClientRow {
        id,
        name,
        description,
        access_token,
        allow_list,
        created_at,
    } = row;

    let parsed_name = ClientName::new(name).map_err(AccessRepositoryError::invalid_persisted_data)?;
    let parsed_token =
        AccessToken::new(access_token).map_err(AccessRepositoryError::invalid_persisted_data)?;
    let parsed_allow_list: AllowList =
        serde_json::from_value(allow_list).map_err(AccessRepositoryError::invalid_persisted_data)?;

    Ok(McpClient::from_persisted(PersistedMcpClientData {
        id,
        name: parsed_name,
        description,
        access_token: parsed_token,
        allow_list: parsed_allow_list,
        created_at,
    }))
}

fn violates(info: &dyn DatabaseErrorInformation, index: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == index)
}
