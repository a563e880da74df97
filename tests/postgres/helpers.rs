//! Shared helpers for `PostgreSQL` integration tests.

use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mcp_gateway::access::{adapters::postgres::PostgresAccessStore, domain::ServerMode};
use mcp_gateway::frontdoor::AuthorizedGateway;
use mcp_gateway::registry::{
    adapters::{
        memory::InMemorySessionConnector,
        postgres::{McpCatalogPgPool, PostgresMcpCatalog},
    },
    domain::{McpServerName, McpToolDefinition, TransportSpec},
    services::{GatewaySettings, RegisterServerRequest},
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use serde_json::json;
use tokio::runtime::Runtime;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL creating the gateway schema.
const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2025-01-01-000000_create_gateway_tables/up.sql");

/// Template database name for the pre-migrated schema.
const TEMPLATE_DB: &str = "mcp_gateway_test_template";

/// Pool size large enough for racing callers to hold separate connections.
const POOL_SIZE: u32 = 4;

/// Gateway wired over `PostgreSQL` stores and scripted backends.
pub type PgGateway =
    AuthorizedGateway<PostgresMcpCatalog, InMemorySessionConnector, PostgresAccessStore, DefaultClock>;

/// Creates a runtime for driving the async adapters from sync tests.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(POOL_SIZE as usize)
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_SCHEMA_SQL)
                .map_err(|e| eyre::eyre!("schema migration failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Guard that drops the test database even if the test panics.
pub struct CleanupGuard<'a> {
    cluster: &'a TestCluster,
    db_name: String,
}

impl<'a> CleanupGuard<'a> {
    pub const fn new(cluster: &'a TestCluster, db_name: String) -> Self {
        Self { cluster, db_name }
    }
}

impl Drop for CleanupGuard<'_> {
    #[expect(clippy::print_stderr, reason = "Test cleanup warnings are informational")]
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(self.db_name.as_str()) {
            eprintln!("Warning: failed to drop test database {}: {e}", self.db_name);
        }
    }
}

/// A migrated database with the gateway wired over it.
pub struct PgHarness<'a> {
    /// Database URL, for tests that tamper with the schema.
    pub url: String,
    /// The catalog adapter under test.
    pub catalog: Arc<PostgresMcpCatalog>,
    /// The access adapter under test.
    pub access: Arc<PostgresAccessStore>,
    /// Scripted backends.
    pub backends: Arc<InMemorySessionConnector>,
    /// The gateway under test.
    pub gateway: PgGateway,
    _guard: CleanupGuard<'a>,
}

impl PgHarness<'_> {
    /// Scripts backend `server` to offer `tools`.
    pub fn offer(&self, server: &str, tools: &[&str]) {
        let definitions = tools
            .iter()
            .map(|tool| McpToolDefinition::new(*tool, format!("{tool} tool"), json!({"type": "object"})))
            .collect();
        self.backends
            .set_tools(&server_name(server), definitions)
            .expect("backend should be scripted");
    }

    /// Runs `sql` directly against the test database.
    pub fn execute(&self, sql: &str) {
        let mut conn = PgConnection::establish(&self.url).expect("test database connection");
        conn.batch_execute(sql).expect("test SQL should run");
    }
}

/// Creates a database from the template and wires a gateway over it.
pub fn setup_gateway<'a>(cluster: &'a TestCluster, prefix: &str) -> Result<PgHarness<'a>, BoxError> {
    ensure_template(cluster)?;
    let db_name = format!("{prefix}_{}", uuid::Uuid::new_v4().simple());
    cluster
        .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
        .map_err(|e| Box::new(e) as BoxError)?;
    let guard = CleanupGuard::new(cluster, db_name.clone());

    let url = cluster.connection().database_url(&db_name);
    let pool: McpCatalogPgPool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(ConnectionManager::<PgConnection>::new(url.clone()))
        .map_err(|e| Box::new(e) as BoxError)?;

    let catalog = Arc::new(PostgresMcpCatalog::new(pool.clone()));
    let access = Arc::new(PostgresAccessStore::new(pool));
    let backends = Arc::new(InMemorySessionConnector::new());
    let gateway = AuthorizedGateway::new(
        Arc::clone(&catalog),
        Arc::clone(&backends),
        Arc::clone(&access),
        Arc::new(DefaultClock),
        GatewaySettings::default(),
    );
    Ok(PgHarness {
        url,
        catalog,
        access,
        backends,
        gateway,
        _guard: guard,
    })
}

/// Creates a gateway already initialized in development mode.
pub fn setup_dev_gateway<'a>(
    cluster: &'a TestCluster,
    prefix: &str,
    rt: &Runtime,
) -> Result<PgHarness<'a>, BoxError> {
    let harness = setup_gateway(cluster, prefix)?;
    rt.block_on(harness.gateway.initialize(ServerMode::Dev))
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(harness)
}

/// Installs a trigger that makes any `operation` on the named tool fail.
///
/// `operation` is `UPDATE` or `DELETE`.
pub fn refuse_tool_writes(harness: &PgHarness<'_>, operation: &str, tool: &str) {
    harness.execute(&format!(
        "CREATE FUNCTION refuse_tool_write() RETURNS trigger AS $$
         BEGIN
             RAISE EXCEPTION 'tool % is write-protected', OLD.name;
         END;
         $$ LANGUAGE plpgsql;
         CREATE TRIGGER refuse_tool_write BEFORE {operation} ON mcp_tools
         FOR EACH ROW WHEN (OLD.name = '{tool}')
         EXECUTE FUNCTION refuse_tool_write();"
    ));
}

/// Parses a server name.
pub fn server_name(raw: &str) -> McpServerName {
    McpServerName::new(raw).expect("server name should be valid")
}

/// Builds a subprocess registration request.
pub fn subprocess_request(server: &str) -> RegisterServerRequest {
    RegisterServerRequest::new(server, "Postgres backend", TransportSpec::subprocess("mcp-test"))
}
