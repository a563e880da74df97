//! MCP gateway: one front door for many Model Context Protocol servers.
//!
//! Backend MCP servers are registered once, their tools are catalogued
//! under `<server>.<tool>` names, and callers invoke those tools through
//! the gateway with a short-lived session per operation.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, MCP sessions)
//! - **Services**: Orchestration over the ports
//!
//! # Modules
//!
//! - [`registry`]: Backend servers, the tool catalog, and tool invocation
//! - [`access`]: Server mode, administrators, scoped clients, and tokens
//! - [`frontdoor`]: The authorized facade every inbound action goes through
//! - [`config`]: Environment configuration
//! - [`telemetry`]: Logging bootstrap

pub mod access;
pub mod config;
pub mod error;
pub mod frontdoor;
pub mod registry;
pub mod telemetry;
