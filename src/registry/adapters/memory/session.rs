//! Scripted in-memory session adapter for gateway tests.

use crate::registry::{
    domain::{McpServer, McpServerName, McpToolDefinition},
    ports::{McpSession, McpSessionConnector, McpSessionError, McpSessionResult},
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// In-memory backend connector.
///
/// Backends are scripted per server name: their tool listing, canned tool
/// results, and injected failures. The connector counts opened and closed
/// sessions so tests can verify that every session is released.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionConnector {
    state: Arc<RwLock<InMemoryBackendsState>>,
}

#[derive(Debug, Default)]
struct InMemoryBackendsState {
    backends: HashMap<McpServerName, ScriptedBackend>,
    opened: usize,
    closed: usize,
}

#[derive(Debug, Clone, Default)]
struct ScriptedBackend {
    reachable: bool,
    tools: Vec<McpToolDefinition>,
    results: HashMap<String, Value>,
    failing_tools: HashMap<String, String>,
    list_failure: Option<String>,
    call_delay: Option<Duration>,
    calls: Vec<RecordedCall>,
}

/// A tool call observed by the scripted backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Tool name as received by the backend.
    pub tool: String,
    /// Arguments as received by the backend.
    pub arguments: Map<String, Value>,
}

fn lock_error(err: impl std::fmt::Display) -> McpSessionError {
    McpSessionError::protocol(std::io::Error::other(err.to_string()))
}

impl InMemorySessionConnector {
    /// Creates a connector with no reachable backends.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn update(
        &self,
        server_name: &McpServerName,
        mutate: impl FnOnce(&mut ScriptedBackend),
    ) -> McpSessionResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let backend = state
            .backends
            .entry(server_name.clone())
            .or_insert_with(|| ScriptedBackend {
                reachable: true,
                ..ScriptedBackend::default()
            });
        mutate(backend);
        Ok(())
    }

    /// Makes `server_name` reachable and replaces the tools it offers.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn set_tools(
        &self,
        server_name: &McpServerName,
        tools: Vec<McpToolDefinition>,
    ) -> McpSessionResult<()> {
        self.update(server_name, |backend| {
            backend.reachable = true;
            backend.tools = tools;
        })
    }

    /// Makes every subsequent open for `server_name` fail.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn set_unreachable(&self, server_name: &McpServerName) -> McpSessionResult<()> {
        self.update(server_name, |backend| backend.reachable = false)
    }

    /// Sets the result returned when `tool` is called.
    ///
    /// Tools without a canned result echo their arguments back.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn set_result(
        &self,
        server_name: &McpServerName,
        tool: impl Into<String>,
        result: Value,
    ) -> McpSessionResult<()> {
        let tool_name = tool.into();
        self.update(server_name, |backend| {
            backend.results.insert(tool_name, result);
        })
    }

    /// Makes calls to `tool` fail with a protocol error carrying `message`.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn fail_tool(
        &self,
        server_name: &McpServerName,
        tool: impl Into<String>,
        message: impl Into<String>,
    ) -> McpSessionResult<()> {
        let tool_name = tool.into();
        let failure = message.into();
        self.update(server_name, |backend| {
            backend.failing_tools.insert(tool_name, failure);
        })
    }

    /// Makes tool listing fail with a protocol error carrying `message`.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn fail_listing(
        &self,
        server_name: &McpServerName,
        message: impl Into<String>,
    ) -> McpSessionResult<()> {
        let failure = message.into();
        self.update(server_name, |backend| backend.list_failure = Some(failure))
    }

    /// Delays every tool call on `server_name` by `delay`.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn delay_calls(&self, server_name: &McpServerName, delay: Duration) -> McpSessionResult<()> {
        self.update(server_name, |backend| backend.call_delay = Some(delay))
    }

    /// Returns the calls received by `server_name`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn calls(&self, server_name: &McpServerName) -> McpSessionResult<Vec<RecordedCall>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .backends
            .get(server_name)
            .map(|backend| backend.calls.clone())
            .unwrap_or_default())
    }

    /// Returns how many sessions are open right now.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn open_sessions(&self) -> McpSessionResult<usize> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.opened.saturating_sub(state.closed))
    }

    /// Returns how many sessions were ever opened.
    ///
    /// # Errors
    ///
    /// Returns session errors when lock acquisition fails.
    pub fn total_opened(&self) -> McpSessionResult<usize> {
        Ok(self.state.read().map_err(lock_error)?.opened)
    }
}

#[async_trait]
impl McpSessionConnector for InMemorySessionConnector {
    async fn open(&self, server: &McpServer) -> McpSessionResult<Box<dyn McpSession>> {
        let mut state = self.state.write().map_err(lock_error)?;
        let reachable = state
            .backends
            .get(server.name())
            .is_some_and(|backend| backend.reachable);
        if !reachable {
            return Err(McpSessionError::unreachable(
                server.name().clone(),
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
            ));
        }

        state.opened += 1;
        Ok(Box::new(InMemorySession {
            state: Arc::clone(&self.state),
            server_name: server.name().clone(),
            released: false,
        }))
    }
}

struct InMemorySession {
    state: Arc<RwLock<InMemoryBackendsState>>,
    server_name: McpServerName,
    released: bool,
}

impl InMemorySession {
    fn backend_snapshot(&self) -> McpSessionResult<ScriptedBackend> {
        let state = self.state.read().map_err(lock_error)?;
        state
            .backends
            .get(&self.server_name)
            .cloned()
            .ok_or_else(|| lock_error(format!("backend {} vanished", self.server_name)))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Ok(mut state) = self.state.write() {
            state.closed += 1;
        }
    }
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl McpSession for InMemorySession {
    async fn list_tools(&self) -> McpSessionResult<Vec<McpToolDefinition>> {
        let backend = self.backend_snapshot()?;
        if let Some(message) = backend.list_failure {
            return Err(McpSessionError::protocol(std::io::Error::other(message)));
        }
        Ok(backend.tools)
    }

    async fn call_tool(
        &self,
        tool: &str,
        arguments: Map<String, Value>,
    ) -> McpSessionResult<Value> {
        let backend = self.backend_snapshot()?;
        if let Some(delay) = backend.call_delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut state = self.state.write().map_err(lock_error)?;
            if let Some(recorded) = state.backends.get_mut(&self.server_name) {
                recorded.calls.push(RecordedCall {
                    tool: tool.to_owned(),
                    arguments: arguments.clone(),
                });
            }
        }

        if let Some(message) = backend.failing_tools.get(tool) {
            return Err(McpSessionError::protocol(std::io::Error::other(
                message.clone(),
            )));
        }

        Ok(backend.results.get(tool).cloned().unwrap_or_else(|| {
            json!({
                "content": [{"type": "text", "text": Value::Object(arguments).to_string()}],
                "isError": false,
            })
        }))
    }

    async fn close(mut self: Box<Self>) -> McpSessionResult<()> {
        self.release();
        Ok(())
    }
}
