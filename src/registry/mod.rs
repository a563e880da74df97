//! Backend server registry, tool catalog, and invocation proxy.
//!
//! Follows the crate's hexagonal layout:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//!
//! Sessions to backends are transient: each catalog listing or tool call
//! opens its own session and closes it before returning.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
