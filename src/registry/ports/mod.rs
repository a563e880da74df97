//! Port contracts for catalog persistence and backend sessions.

mod repository;
mod session;

#[cfg(test)]
pub use repository::MockMcpCatalogRepository;
pub use repository::{McpCatalogError, McpCatalogRepository, McpCatalogResult};
pub use session::{McpSession, McpSessionConnector, McpSessionError, McpSessionResult};
