//! `PostgreSQL` adapter for access-control persistence.

mod models;
mod schema;
mod store;

pub use store::{AccessPgPool, PostgresAccessStore};
