//! In-memory adapters for the catalog and backend sessions.

mod repository;
mod session;

pub use repository::InMemoryMcpCatalog;
pub use session::{InMemorySessionConnector, RecordedCall};
