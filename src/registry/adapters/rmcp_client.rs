//! Session adapter backed by the `rmcp` client.
//!
//! Subprocess backends are spawned per session and killed when the session
//! ends. Streamable HTTP backends get a fresh client connection per session.

use crate::registry::{
    domain::{McpServer, McpToolDefinition, McpTransport},
    ports::{McpSession, McpSessionConnector, McpSessionError, McpSessionResult},
};
use async_trait::async_trait;
use rmcp::{
    RoleClient, ServiceExt,
    model::CallToolRequestParam,
    service::RunningService,
    transport::{
        ConfigureCommandExt, StreamableHttpClientTransport, TokioChildProcess,
        streamable_http_client::StreamableHttpClientTransportConfig,
    },
};
use serde_json::{Map, Value};
use tracing::debug;

/// Opens real protocol sessions over the configured transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmcpSessionConnector;

impl RmcpSessionConnector {
    /// Creates a connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl McpSessionConnector for RmcpSessionConnector {
    async fn open(&self, server: &McpServer) -> McpSessionResult<Box<dyn McpSession>> {
        let unreachable = |err: String| {
            McpSessionError::unreachable(server.name().clone(), std::io::Error::other(err))
        };

        let service = match server.transport() {
            McpTransport::Subprocess(config) => {
                let command = tokio::process::Command::new(config.command()).configure(|cmd| {
                    cmd.args(config.args())
                        .envs(config.env().iter())
                        .stderr(std::process::Stdio::inherit())
                        .kill_on_drop(true);
                });
                let transport =
                    TokioChildProcess::new(command).map_err(|err| unreachable(err.to_string()))?;
                ().serve(transport)
                    .await
                    .map_err(|err| unreachable(err.to_string()))?
            }
            McpTransport::StreamableHttp(config) => {
                let transport = match config.bearer_token() {
                    Some(token) => {
                        let mut transport_config =
                            StreamableHttpClientTransportConfig::with_uri(config.url().to_owned());
                        transport_config.auth_header = Some(token.to_owned());
                        StreamableHttpClientTransport::from_config(transport_config)
                    }
                    None => StreamableHttpClientTransport::from_uri(config.url().to_owned()),
                };
                ().serve(transport)
                    .await
                    .map_err(|err| unreachable(err.to_string()))?
            }
        };

        debug!(server = %server.name(), transport = %server.transport().kind(), "opened MCP session");
        Ok(Box::new(RmcpSession { service }))
    }
}

/// One initialized `rmcp` client session.
///
/// Dropping the running service cancels it, which tears down the child
/// process or HTTP connection.
struct RmcpSession {
    service: RunningService<RoleClient, ()>,
}

#[async_trait]
impl McpSession for RmcpSession {
    async fn list_tools(&self) -> McpSessionResult<Vec<McpToolDefinition>> {
        let tools = self
            .service
            .peer()
            .list_all_tools()
            .await
            .map_err(|err| McpSessionError::protocol(std::io::Error::other(err.to_string())))?;

        Ok(tools
            .into_iter()
            .map(|tool| {
                let description = tool.description.as_deref().unwrap_or_default().to_owned();
                let input_schema = Value::Object(tool.input_schema.as_ref().clone());
                McpToolDefinition::new(tool.name.into_owned(), description, input_schema)
            })
            .collect())
    }

    async fn call_tool(
        &self,
        tool: &str,
        arguments: Map<String, Value>,
    ) -> McpSessionResult<Value> {
        let request = CallToolRequestParam {
            name: tool.to_owned().into(),
            arguments: Some(arguments),
        };
        let result = self
            .service
            .peer()
            .call_tool(request)
            .await
            .map_err(|err| McpSessionError::protocol(std::io::Error::other(err.to_string())))?;
        serde_json::to_value(result).map_err(McpSessionError::protocol)
    }

    async fn close(self: Box<Self>) -> McpSessionResult<()> {
        self.service
            .cancel()
            .await
            .map_err(|err| McpSessionError::protocol(std::io::Error::other(err.to_string())))?;
        Ok(())
    }
}
