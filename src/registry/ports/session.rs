//! Session port: one short-lived protocol session to one backend server.

use crate::registry::domain::{McpServer, McpServerName, McpToolDefinition};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Result type for session operations.
pub type McpSessionResult<T> = Result<T, McpSessionError>;

/// Opens transport-specific sessions to backend servers.
#[async_trait]
pub trait McpSessionConnector: Send + Sync {
    /// Opens and initializes a session to `server`.
    ///
    /// # Errors
    ///
    /// Returns [`McpSessionError::Unreachable`] when the process cannot be
    /// spawned, the connection is refused, or the handshake fails.
    async fn open(&self, server: &McpServer) -> McpSessionResult<Box<dyn McpSession>>;
}

/// An open session, used for exactly one logical operation then closed.
///
/// Dropping a session without calling [`McpSession::close`] must still
/// release its process or connection; callers rely on this when a request is
/// cancelled mid-flight.
#[async_trait]
pub trait McpSession: Send + Sync {
    /// Lists every tool the backend currently offers.
    async fn list_tools(&self) -> McpSessionResult<Vec<McpToolDefinition>>;

    /// Calls `tool` with `arguments`, returning the backend result verbatim.
    async fn call_tool(&self, tool: &str, arguments: Map<String, Value>)
    -> McpSessionResult<Value>;

    /// Closes the session and releases its resources.
    async fn close(self: Box<Self>) -> McpSessionResult<()>;
}

/// Errors returned by session adapters.
#[derive(Debug, Clone, Error)]
pub enum McpSessionError {
    /// The session could not be opened.
    #[error("MCP server '{server}' is unreachable: {reason}")]
    Unreachable {
        /// Server that could not be reached.
        server: McpServerName,
        /// Underlying transport failure.
        reason: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The backend answered a request with a protocol-level error.
    #[error("MCP request failed: {0}")]
    Protocol(Arc<dyn std::error::Error + Send + Sync>),

    /// The operation did not finish within its deadline.
    #[error("MCP {operation} timed out after {seconds}s")]
    TimedOut {
        /// Operation that timed out.
        operation: &'static str,
        /// Deadline in whole seconds.
        seconds: u64,
    },

    /// The tool ran but flagged its result as an error.
    #[error("tool reported an error: {0}")]
    ToolReported(String),
}

impl McpSessionError {
    /// Wraps a failure to open a session.
    pub fn unreachable(
        server: McpServerName,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unreachable {
            server,
            reason: Arc::new(err),
        }
    }

    /// Wraps a protocol-level failure.
    pub fn protocol(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Protocol(Arc::new(err))
    }
}
