//! Shared fixtures for in-memory gateway integration tests.

use std::sync::Arc;

use mcp_gateway::access::{adapters::memory::InMemoryAccessStore, domain::ServerMode};
use mcp_gateway::frontdoor::AuthorizedGateway;
use mcp_gateway::registry::{
    adapters::memory::{InMemoryMcpCatalog, InMemorySessionConnector},
    domain::{McpServerName, McpToolDefinition, QualifiedToolName, TransportSpec},
    services::{GatewaySettings, RegisterServerRequest, ToolInvocationRequest},
};
use mockable::DefaultClock;
use serde_json::{Map, json};

/// Gateway wired over in-memory stores.
pub type TestGateway = AuthorizedGateway<
    InMemoryMcpCatalog,
    InMemorySessionConnector,
    InMemoryAccessStore,
    DefaultClock,
>;

/// A gateway together with the handles tests script and inspect.
pub struct Harness {
    /// The catalog behind the gateway.
    pub catalog: Arc<InMemoryMcpCatalog>,
    /// Scripted backends.
    pub backends: Arc<InMemorySessionConnector>,
    /// The gateway under test.
    pub gateway: TestGateway,
}

impl Harness {
    /// Builds an uninitialized gateway with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(GatewaySettings::default())
    }

    /// Builds an uninitialized gateway with `settings`.
    #[must_use]
    pub fn with_settings(settings: GatewaySettings) -> Self {
        let catalog = Arc::new(InMemoryMcpCatalog::new());
        let backends = Arc::new(InMemorySessionConnector::new());
        let gateway = AuthorizedGateway::new(
            Arc::clone(&catalog),
            Arc::clone(&backends),
            Arc::new(InMemoryAccessStore::new()),
            Arc::new(DefaultClock),
            settings,
        );
        Self {
            catalog,
            backends,
            gateway,
        }
    }

    /// Builds a gateway initialized in development mode.
    pub async fn dev() -> Self {
        let harness = Self::new();
        harness
            .gateway
            .initialize(ServerMode::Dev)
            .await
            .expect("dev initialization should succeed");
        harness
    }

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
}

/// Parses a server name.
#[must_use]
pub fn server_name(raw: &str) -> McpServerName {
    McpServerName::new(raw).expect("server name should be valid")
}

/// Builds a subprocess registration request.
#[must_use]
pub fn subprocess_request(server: &str) -> RegisterServerRequest {
    RegisterServerRequest::new(server, "Integration backend", TransportSpec::subprocess("mcp-test"))
}

/// Builds an invocation with no arguments.
#[must_use]
pub fn invocation(raw: &str) -> ToolInvocationRequest {
    let name = QualifiedToolName::parse(raw).expect("qualified name should be valid");
    ToolInvocationRequest::new(name, Map::new())
}
