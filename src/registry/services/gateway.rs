//! Gateway service: registration, catalog management, and invocation.

use super::catalog::{CatalogSyncReport, CatalogSyncWarning, RefreshError, ToolCatalogSynchronizer};
use crate::error::GatewayErrorKind;
use crate::registry::{
    domain::{
        CatalogTool, McpServer, McpServerName, QualifiedToolName, RegistryDomainError, ToolTarget,
        TransportSpec,
    },
    ports::{
        McpCatalogError, McpCatalogRepository, McpSession, McpSessionConnector, McpSessionError,
    },
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Routing field stripped from invocation bodies before forwarding.
const ROUTING_NAME_FIELD: &str = "name";

/// Deadlines applied to backend sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Maximum time to open and initialize a session.
    pub session_open_timeout: Duration,
    /// Maximum time a single tool call may take.
    pub tool_call_timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            session_open_timeout: Duration::from_secs(30),
            tool_call_timeout: Duration::from_secs(120),
        }
    }
}

/// Request payload for registering a backend server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterServerRequest {
    /// Unique server name.
    pub name: String,
    /// Human description.
    #[serde(default)]
    pub description: String,
    /// Transport fields.
    #[serde(flatten)]
    pub transport: TransportSpec,
}

impl RegisterServerRequest {
    /// Creates a registration request.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        transport: TransportSpec,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            transport,
        }
    }
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerRegistration {
    /// The persisted server record.
    pub server: McpServer,
    /// Tools catalogued during registration.
    pub tools: Vec<QualifiedToolName>,
    /// Advisory tool-sync problems; registration still succeeded.
    pub tool_sync_warnings: Vec<CatalogSyncWarning>,
}

/// Result of a successful deregistration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerDeregistration {
    /// The removed server record.
    pub server: McpServer,
    /// Tools removed together with the server.
    pub removed_tools: Vec<QualifiedToolName>,
}

/// A tool call addressed by qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocationRequest {
    /// Tool to call.
    pub name: QualifiedToolName,
    /// Arguments forwarded to the backend.
    pub arguments: Map<String, Value>,
}

impl ToolInvocationRequest {
    /// Creates an invocation request.
    #[must_use]
    pub const fn new(name: QualifiedToolName, arguments: Map<String, Value>) -> Self {
        Self { name, arguments }
    }

    /// Parses a router body of the form `{"name": "<server>.<tool>", ...}`.
    ///
    /// The `name` field selects the tool and is removed; every other field
    /// is forwarded as an argument.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayServiceError::InvalidRequest`] when the body is not
    /// an object or lacks a string `name`, or name validation errors.
    pub fn from_body(body: Value) -> GatewayServiceResult<Self> {
        let Value::Object(mut arguments) = body else {
            return Err(GatewayServiceError::InvalidRequest(
                "invocation body must be a JSON object".to_owned(),
            ));
        };
        let Some(Value::String(raw_name)) = arguments.remove(ROUTING_NAME_FIELD) else {
            return Err(GatewayServiceError::InvalidRequest(
                "invocation body needs a string `name` field".to_owned(),
            ));
        };
        let name = QualifiedToolName::parse(&raw_name)?;
        Ok(Self { name, arguments })
    }
}

/// Service-level errors for gateway operations.
#[derive(Debug, Clone, Error)]
pub enum GatewayServiceError {
    /// Name or transport validation failed.
    #[error(transparent)]
    Domain(#[from] RegistryDomainError),

    /// Catalog persistence failed.
    #[error(transparent)]
    Catalog(#[from] McpCatalogError),

    /// The request body is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A server with this name is already registered.
    #[error("MCP server '{0}' is already registered")]
    ServerAlreadyRegistered(McpServerName),

    /// No server has this name.
    #[error("MCP server '{0}' not found")]
    ServerNotFound(McpServerName),

    /// No tool has this qualified name.
    #[error("tool '{0}' not found")]
    ToolNotFound(QualifiedToolName),

    /// The tool exists but is disabled.
    #[error("tool '{0}' is disabled")]
    ToolDisabled(QualifiedToolName),

    /// A session to the backend could not be opened.
    #[error(transparent)]
    Unreachable(McpSessionError),

    /// The backend failed while executing the tool.
    #[error("tool '{tool}' failed: {reason}")]
    InvocationFailed {
        /// Tool that failed.
        tool: QualifiedToolName,
        /// Backend failure.
        reason: McpSessionError,
    },

    /// The backend could not list its tools during a refresh.
    #[error("tool listing for '{server}' failed: {reason}")]
    ListingFailed {
        /// Server whose listing failed.
        server: McpServerName,
        /// Backend failure.
        reason: McpSessionError,
    },
}

impl GatewayServiceError {
    /// Classifies the error for callers.
    #[must_use]
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::Catalog(err) => catalog_error_kind(err),
            Self::InvalidRequest(_) => GatewayErrorKind::InvalidConfig,
            Self::ServerAlreadyRegistered(_) => GatewayErrorKind::Conflict,
            Self::ServerNotFound(_) | Self::ToolNotFound(_) => GatewayErrorKind::NotFound,
            Self::ToolDisabled(_) => GatewayErrorKind::ToolDisabled,
            Self::Unreachable(_) => GatewayErrorKind::BackendUnreachable,
            Self::InvocationFailed { .. } | Self::ListingFailed { .. } => {
                GatewayErrorKind::InvocationFailed
            }
        }
    }
}

const fn catalog_error_kind(err: &McpCatalogError) -> GatewayErrorKind {
    match err {
        McpCatalogError::DuplicateServer(_)
        | McpCatalogError::DuplicateServerName(_)
        | McpCatalogError::DuplicateTool(_) => GatewayErrorKind::Conflict,
        McpCatalogError::ServerNotFound(_) | McpCatalogError::ToolNotFound(_) => {
            GatewayErrorKind::NotFound
        }
        McpCatalogError::InvalidPersistedData(_) | McpCatalogError::Persistence(_) => {
            GatewayErrorKind::Internal
        }
    }
}

/// Result type for gateway service operations.
pub type GatewayServiceResult<T> = Result<T, GatewayServiceError>;

/// Gateway orchestration service.
///
/// Constructed once at process start and shared by reference; it holds no
/// per-request state and caches nothing, so every read hits the catalog.
#[derive(Clone)]
pub struct GatewayService<R, S, C>
where
    R: McpCatalogRepository,
    S: McpSessionConnector,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    connector: Arc<S>,
    synchronizer: ToolCatalogSynchronizer<R, C>,
    clock: Arc<C>,
    settings: GatewaySettings,
}

impl<R, S, C> GatewayService<R, S, C>
where
    R: McpCatalogRepository,
    S: McpSessionConnector,
    C: Clock + Send + Sync,
{
    /// Creates a gateway service.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        connector: Arc<S>,
        clock: Arc<C>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            synchronizer: ToolCatalogSynchronizer::new(Arc::clone(&repository), Arc::clone(&clock)),
            repository,
            connector,
            clock,
            settings,
        }
    }

    /// Returns the session deadlines in force.
    #[must_use]
    pub const fn settings(&self) -> GatewaySettings {
        self.settings
    }

    /// Registers a backend server after a successful trial session, then
    /// catalogues its tools.
    ///
    /// Tool cataloguing is best-effort: its problems are returned as
    /// warnings alongside the persisted server.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayServiceError`] with kind `InvalidName`,
    /// `InvalidConfig`, `Conflict`, or `BackendUnreachable`. Nothing is
    /// persisted on failure.
    #[instrument(skip_all, fields(server = %request.name))]
    pub async fn register_server(
        &self,
        request: RegisterServerRequest,
    ) -> GatewayServiceResult<ServerRegistration> {
        let name = McpServerName::new(request.name)?;
        let transport = request.transport.build()?;

        if self.repository.find_server_by_name(&name).await?.is_some() {
            return Err(GatewayServiceError::ServerAlreadyRegistered(name));
        }

        let server = McpServer::new(name, request.description, transport, &*self.clock);
        let session = self.open_session(&server).await?;

        if let Err(err) = self.repository.insert_server(&server).await {
            close_session(&server, session).await;
            return Err(match err {
                McpCatalogError::DuplicateServerName(taken) => {
                    GatewayServiceError::ServerAlreadyRegistered(taken)
                }
                other => GatewayServiceError::Catalog(other),
            });
        }

        let report = self.synchronizer.register_tools(&server, session.as_ref()).await;
        close_session(&server, session).await;

        info!(
            transport = %server.transport().kind(),
            tools = report.added.len(),
            "registered MCP server"
        );
        Ok(ServerRegistration {
            server,
            tools: report.added,
            tool_sync_warnings: report.warnings,
        })
    }

    /// Removes a server and every tool it owns.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the server is absent, or the catalog failure
    /// that aborted teardown; in that case nothing was removed.
    #[instrument(skip_all, fields(server = %name))]
    pub async fn deregister_server(
        &self,
        name: &McpServerName,
    ) -> GatewayServiceResult<ServerDeregistration> {
        let server = self.find_server(name).await?;
        let removed = self.synchronizer.tear_down(&server).await.map_err(|err| {
            warn!(error = %err, "deregistration aborted");
            match err {
                McpCatalogError::ServerNotFound(_) => {
                    GatewayServiceError::ServerNotFound(name.clone())
                }
                other => GatewayServiceError::Catalog(other),
            }
        })?;
        Ok(ServerDeregistration {
            server,
            removed_tools: removed
                .into_iter()
                .map(|tool| tool.qualified_name().clone())
                .collect(),
        })
    }

    /// Returns every registered server ordered by name.
    ///
    /// # Errors
    ///
    /// Returns catalog errors.
    pub async fn list_servers(&self) -> GatewayServiceResult<Vec<McpServer>> {
        Ok(self.repository.list_servers().await?)
    }

    /// Returns one server by name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the server is absent.
    pub async fn get_server(&self, name: &McpServerName) -> GatewayServiceResult<McpServer> {
        self.find_server(name).await
    }

    /// Returns all tools, or only those of `server` when given.
    ///
    /// An unknown server yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns catalog errors.
    pub async fn list_tools(
        &self,
        server: Option<&McpServerName>,
    ) -> GatewayServiceResult<Vec<CatalogTool>> {
        let tools = match server {
            Some(name) => self.repository.list_tools_for_server(name).await?,
            None => self.repository.list_tools().await?,
        };
        Ok(tools)
    }

    /// Returns one tool by qualified name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the tool is absent.
    pub async fn get_tool(&self, name: &QualifiedToolName) -> GatewayServiceResult<CatalogTool> {
        self.repository
            .find_tool(name)
            .await?
            .ok_or_else(|| GatewayServiceError::ToolNotFound(name.clone()))
    }

    /// Enables the targeted tools, returning those whose flag changed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the target matches no tool or server.
    pub async fn enable_tools(&self, target: &ToolTarget) -> GatewayServiceResult<Vec<CatalogTool>> {
        self.set_enabled(target, true).await
    }

    /// Disables the targeted tools, returning those whose flag changed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the target matches no tool or server.
    pub async fn disable_tools(
        &self,
        target: &ToolTarget,
    ) -> GatewayServiceResult<Vec<CatalogTool>> {
        self.set_enabled(target, false).await
    }

    #[instrument(skip_all, fields(target = %target, enabled = enabled))]
    async fn set_enabled(
        &self,
        target: &ToolTarget,
        enabled: bool,
    ) -> GatewayServiceResult<Vec<CatalogTool>> {
        let candidates = match target {
            ToolTarget::Tool(name) => vec![self.get_tool(name).await?],
            ToolTarget::Server(name) => {
                self.find_server(name).await?;
                self.repository.list_tools_for_server(name).await?
            }
        };

        let changed: Vec<CatalogTool> = candidates
            .into_iter()
            .filter_map(|mut tool| tool.set_enabled(enabled, &*self.clock).then_some(tool))
            .collect();
        if !changed.is_empty() {
            self.repository.update_tools(&changed).await?;
        }
        info!(enabled, changed = changed.len(), "updated tool flags");
        Ok(changed)
    }

    /// Forwards a tool call to its backend and returns the result verbatim.
    ///
    /// A fresh session is opened for the call and closed on every path. A
    /// result flagged `isError` by the backend is reported as a failed call.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `ToolDisabled`, `BackendUnreachable`, or
    /// `InvocationFailed` (including call timeouts and tool-reported errors).
    #[instrument(skip_all, fields(tool = %request.name))]
    pub async fn invoke_tool(&self, request: ToolInvocationRequest) -> GatewayServiceResult<Value> {
        let ToolInvocationRequest { name, arguments } = request;
        let tool = self.get_tool(&name).await?;
        if !tool.is_enabled() {
            return Err(GatewayServiceError::ToolDisabled(name));
        }
        let server = self
            .repository
            .find_server_by_name(name.server())
            .await?
            .ok_or_else(|| GatewayServiceError::ToolNotFound(name.clone()))?;

        let session = self.open_session(&server).await?;
        let outcome = tokio::time::timeout(
            self.settings.tool_call_timeout,
            session.call_tool(tool.name(), arguments),
        )
        .await;
        close_session(&server, session).await;

        let reason = match outcome {
            Ok(Ok(result)) => {
                let Some(message) = reported_tool_error(&result) else {
                    debug!("tool call completed");
                    return Ok(result);
                };
                McpSessionError::ToolReported(message)
            }
            Ok(Err(err)) => err,
            Err(_) => McpSessionError::TimedOut {
                operation: "tool call",
                seconds: self.settings.tool_call_timeout.as_secs(),
            },
        };
        warn!(error = %reason, "tool call failed");
        Err(GatewayServiceError::InvocationFailed { tool: name, reason })
    }

    /// Re-lists a server's tools and reconciles the catalog with them.
    ///
    /// Enabled flags of tools still offered are preserved.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `BackendUnreachable`, or `InvocationFailed` when
    /// the backend cannot list its tools.
    #[instrument(skip_all, fields(server = %name))]
    pub async fn resync_server_tools(
        &self,
        name: &McpServerName,
    ) -> GatewayServiceResult<CatalogSyncReport> {
        let server = self.find_server(name).await?;
        let session = self.open_session(&server).await?;
        let outcome = self.synchronizer.refresh_tools(&server, session.as_ref()).await;
        close_session(&server, session).await;

        outcome.map_err(|err| match err {
            RefreshError::Listing(reason) => GatewayServiceError::ListingFailed {
                server: name.clone(),
                reason,
            },
            RefreshError::Catalog(catalog) => GatewayServiceError::Catalog(catalog),
        })
    }

    async fn find_server(&self, name: &McpServerName) -> GatewayServiceResult<McpServer> {
        self.repository
            .find_server_by_name(name)
            .await?
            .ok_or_else(|| GatewayServiceError::ServerNotFound(name.clone()))
    }

    async fn open_session(&self, server: &McpServer) -> GatewayServiceResult<Box<dyn McpSession>> {
        let timeout = self.settings.session_open_timeout;
        match tokio::time::timeout(timeout, self.connector.open(server)).await {
            Ok(Ok(session)) => Ok(session),
            Ok(Err(err)) => {
                warn!(server = %server.name(), error = %err, "could not open MCP session");
                Err(GatewayServiceError::Unreachable(err))
            }
            Err(_) => {
                warn!(server = %server.name(), "MCP session open timed out");
                Err(GatewayServiceError::Unreachable(McpSessionError::TimedOut {
                    operation: "session open",
                    seconds: timeout.as_secs(),
                }))
            }
        }
    }
}

/// Returns the error text of a call result the backend flagged with
/// `isError`, or `None` for a successful result.
fn reported_tool_error(result: &Value) -> Option<String> {
    if result.get("isError").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    let text = result
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|joined| !joined.trim().is_empty());
    Some(text.unwrap_or_else(|| "no error details".to_owned()))
}

async fn close_session(server: &McpServer, session: Box<dyn McpSession>) {
    if let Err(err) = session.close().await {
        warn!(server = %server.name(), error = %err, "failed to close MCP session");
    }
}
