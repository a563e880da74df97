//! Adapter implementations for catalog persistence and backend sessions.

pub mod memory;
pub mod postgres;
pub mod rmcp_client;
