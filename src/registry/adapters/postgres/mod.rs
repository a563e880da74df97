//! `PostgreSQL` adapter for the backend server and tool catalog.

mod models;
mod repository;
mod schema;

pub use repository::{McpCatalogPgPool, PostgresMcpCatalog};
