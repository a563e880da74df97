//! Domain model for backend servers and their tool catalog.
//!
//! Servers own their tools; a tool is only unique within its server, so
//! everything outside the catalog addresses tools by [`QualifiedToolName`].
//! Transport configuration is opaque here and interpreted only by session
//! adapters.

mod error;
mod ids;
mod server;
mod tool;
mod transport;

pub use error::RegistryDomainError;
pub use ids::{
    McpServerId, McpServerName, QualifiedToolName, TOOL_NAME_SEPARATOR, ToolId, ToolTarget,
};
pub use server::{McpServer, PersistedMcpServerData};
pub use tool::{CatalogTool, McpToolDefinition, PersistedCatalogToolData};
pub use transport::{
    McpTransport, StreamableHttpTransportConfig, SubprocessTransportConfig, TransportKind,
    TransportSpec,
};
