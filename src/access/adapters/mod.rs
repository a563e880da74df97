//! Adapter implementations for access-control persistence.

pub mod memory;
pub mod postgres;
