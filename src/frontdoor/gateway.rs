//! Authorized gateway facade.

use super::{FrontdoorError, FrontdoorResult};
use crate::access::{
    domain::{AccessAction, ClientName, McpClient, Principal, ServerAccessPolicy, ServerMode},
    ports::AccessStore,
    services::{
        AuthorizationService, ClientService, CreateClientRequest, InitOutcome, IssuedClient,
        authorize,
    },
};
use crate::registry::{
    domain::{CatalogTool, McpServer, McpServerName, QualifiedToolName, ToolTarget},
    ports::{McpCatalogRepository, McpSessionConnector},
    services::{
        CatalogSyncReport, GatewayService, GatewayServiceError, GatewaySettings,
        RegisterServerRequest, ServerDeregistration, ServerRegistration, ToolInvocationRequest,
    },
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

/// Every inbound action, authenticated and authorized before it reaches
/// the gateway.
///
/// `credential` is the bearer token presented by the caller, if any. Raw
/// names are parsed here so callers get the same error kinds whatever
/// front end they use.
#[derive(Clone)]
pub struct AuthorizedGateway<R, S, A, C>
where
    R: McpCatalogRepository,
    S: McpSessionConnector,
    A: AccessStore,
    C: Clock + Send + Sync,
{
    authorization: AuthorizationService<A, C>,
    clients: ClientService<A, C>,
    gateway: GatewayService<R, S, C>,
}

impl<R, S, A, C> AuthorizedGateway<R, S, A, C>
where
    R: McpCatalogRepository,
    S: McpSessionConnector,
    A: AccessStore,
    C: Clock + Send + Sync,
{
    /// Wires the facade over its stores and session connector.
    #[must_use]
    pub fn new(
        catalog: Arc<R>,
        connector: Arc<S>,
        access: Arc<A>,
        clock: Arc<C>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            authorization: AuthorizationService::new(Arc::clone(&access), Arc::clone(&clock)),
            clients: ClientService::new(access, Arc::clone(&clock)),
            gateway: GatewayService::new(catalog, connector, clock, settings),
        }
    }

    /// Initializes the gateway once; later calls are reported no-ops.
    ///
    /// # Errors
    ///
    /// Returns internal errors only.
    pub async fn initialize(&self, mode: ServerMode) -> FrontdoorResult<InitOutcome> {
        self.authorization
            .initialize(mode)
            .await
            .map_err(observed)
    }

    /// Describes the caller.
    ///
    /// # Errors
    ///
    /// Returns authentication errors.
    pub async fn whoami(&self, credential: Option<&str>) -> FrontdoorResult<Principal> {
        self.admit(credential, &AccessAction::Identify).await
    }

    /// Registers a backend server.
    ///
    /// # Errors
    ///
    /// Returns access errors or the gateway's registration errors.
    pub async fn register_server(
        &self,
        credential: Option<&str>,
        request: RegisterServerRequest,
    ) -> FrontdoorResult<ServerRegistration> {
        self.admit(credential, &AccessAction::ManageServers).await?;
        self.gateway.register_server(request).await.map_err(observed)
    }

    /// Deregisters a backend server and its tools.
    ///
    /// # Errors
    ///
    /// Returns access errors, `InvalidName`, `NotFound`, or teardown errors.
    pub async fn deregister_server(
        &self,
        credential: Option<&str>,
        name: &str,
    ) -> FrontdoorResult<ServerDeregistration> {
        self.admit(credential, &AccessAction::ManageServers).await?;
        let server = McpServerName::new(name)?;
        self.gateway.deregister_server(&server).await.map_err(observed)
    }

    /// Lists every registered server.
    ///
    /// # Errors
    ///
    /// Returns access or catalog errors.
    pub async fn list_servers(&self, credential: Option<&str>) -> FrontdoorResult<Vec<McpServer>> {
        self.admit(credential, &AccessAction::ViewServers).await?;
        self.gateway.list_servers().await.map_err(observed)
    }

    /// Returns one server.
    ///
    /// # Errors
    ///
    /// Returns access errors, `InvalidName`, or `NotFound`.
    pub async fn get_server(
        &self,
        credential: Option<&str>,
        name: &str,
    ) -> FrontdoorResult<McpServer> {
        self.admit(credential, &AccessAction::ViewServers).await?;
        let server = McpServerName::new(name)?;
        self.gateway.get_server(&server).await.map_err(observed)
    }

    /// Reconciles a server's catalog with what it currently offers.
    ///
    /// # Errors
    ///
    /// Returns access errors or refresh errors.
    pub async fn resync_server_tools(
        &self,
        credential: Option<&str>,
        name: &str,
    ) -> FrontdoorResult<CatalogSyncReport> {
        self.admit(credential, &AccessAction::ManageServers).await?;
        let server = McpServerName::new(name)?;
        self.gateway.resync_server_tools(&server).await.map_err(observed)
    }

    /// Lists tools, optionally for one server.
    ///
    /// Scoped clients see only enabled tools of servers on their
    /// allow-list, and naming another server is `Forbidden`. A filter that
    /// names no registered server yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns access or catalog errors.
    pub async fn list_tools(
        &self,
        credential: Option<&str>,
        server: Option<&str>,
    ) -> FrontdoorResult<Vec<CatalogTool>> {
        let principal = self.admit(credential, &AccessAction::ListTools).await?;
        let filter = match server {
            Some(raw) => match McpServerName::new(raw) {
                Ok(name) => {
                    authorize(&principal, &AccessAction::UseServerTools(name.clone()))?;
                    Some(name)
                }
                Err(_) => return Ok(Vec::new()),
            },
            None => None,
        };

        let tools = self
            .gateway
            .list_tools(filter.as_ref())
            .await
            .map_err(observed)?;
        if !principal.is_scoped() {
            return Ok(tools);
        }
        Ok(tools
            .into_iter()
            .filter(|tool| tool.is_enabled() && principal.has_access(tool.server_name()))
            .collect())
    }

    /// Returns one tool.
    ///
    /// The caller is authenticated before the name is parsed. Scoped clients
    /// cannot see disabled tools.
    ///
    /// # Errors
    ///
    /// Returns access errors, `InvalidName`, or `NotFound`.
    pub async fn get_tool(
        &self,
        credential: Option<&str>,
        name: &str,
    ) -> FrontdoorResult<CatalogTool> {
        let principal = self.admit(credential, &AccessAction::ListTools).await?;
        let qualified = QualifiedToolName::parse(name)?;
        authorize(&principal, &AccessAction::UseServerTools(qualified.server().clone()))?;
        let tool = self.gateway.get_tool(&qualified).await.map_err(observed)?;
        if principal.is_scoped() && !tool.is_enabled() {
            return Err(GatewayServiceError::ToolNotFound(qualified).into());
        }
        Ok(tool)
    }

    /// Enables a tool, or every tool of a server.
    ///
    /// # Errors
    ///
    /// Returns access errors, `InvalidName`, or `NotFound`.
    pub async fn enable_tools(
        &self,
        credential: Option<&str>,
        target: &str,
    ) -> FrontdoorResult<Vec<CatalogTool>> {
        self.admit(credential, &AccessAction::ManageTools).await?;
        let parsed = ToolTarget::parse(target)?;
        self.gateway.enable_tools(&parsed).await.map_err(observed)
    }

    /// Disables a tool, or every tool of a server.
    ///
    /// # Errors
    ///
    /// Returns access errors, `InvalidName`, or `NotFound`.
    pub async fn disable_tools(
        &self,
        credential: Option<&str>,
        target: &str,
    ) -> FrontdoorResult<Vec<CatalogTool>> {
        self.admit(credential, &AccessAction::ManageTools).await?;
        let parsed = ToolTarget::parse(target)?;
        self.gateway.disable_tools(&parsed).await.map_err(observed)
    }

    /// Invokes a tool.
    ///
    /// Permission on the owning server is checked before the tool is looked
    /// up, so a scoped client learns nothing about servers outside its
    /// allow-list.
    ///
    /// # Errors
    ///
    /// Returns access errors or the gateway's invocation errors.
    pub async fn invoke_tool(
        &self,
        credential: Option<&str>,
        request: ToolInvocationRequest,
    ) -> FrontdoorResult<Value> {
        self.admit(
            credential,
            &AccessAction::UseServerTools(request.name.server().clone()),
        )
        .await?;
        self.gateway.invoke_tool(request).await.map_err(observed)
    }

    /// Creates a scoped client and returns its token once.
    ///
    /// # Errors
    ///
    /// Returns access errors, validation errors, or `Conflict`.
    pub async fn create_client(
        &self,
        credential: Option<&str>,
        request: CreateClientRequest,
    ) -> FrontdoorResult<IssuedClient> {
        self.admit(credential, &AccessAction::ManageClients).await?;
        self.clients.create_client(request).await.map_err(observed)
    }

    /// Lists scoped clients without their tokens.
    ///
    /// # Errors
    ///
    /// Returns access or repository errors.
    pub async fn list_clients(&self, credential: Option<&str>) -> FrontdoorResult<Vec<McpClient>> {
        self.admit(credential, &AccessAction::ManageClients).await?;
        self.clients.list_clients().await.map_err(observed)
    }

    /// Deletes a scoped client.
    ///
    /// # Errors
    ///
    /// Returns access errors, `InvalidName`, or `NotFound`.
    pub async fn delete_client(&self, credential: Option<&str>, name: &str) -> FrontdoorResult<()> {
        self.admit(credential, &AccessAction::ManageClients).await?;
        let client = ClientName::new(name)?;
        self.clients.delete_client(&client).await.map_err(observed)
    }

    async fn admit(
        &self,
        credential: Option<&str>,
        action: &AccessAction,
    ) -> FrontdoorResult<Principal> {
        let principal = self
            .authorization
            .authenticate(credential)
            .await
            .map_err(observed)?;
        if let Err(err) = authorize(&principal, action) {
            warn!(principal = %principal.label(), action = %action, "denied");
            return Err(err.into());
        }
        Ok(principal)
    }
}

fn observed(err: impl Into<FrontdoorError>) -> FrontdoorError {
    let converted = err.into();
    if !converted.kind().is_public() {
        error!(error = %converted, "internal gateway failure");
    }
    converted
}
