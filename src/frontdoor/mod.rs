//! The authorized entry point used by request routers and the CLI.
//!
//! Every action resolves the caller's credential, checks the action
//! against the caller's permissions, and only then reaches the gateway.

mod error;
mod gateway;

pub use error::{FrontdoorError, FrontdoorResult};
pub use gateway::AuthorizedGateway;

#[cfg(test)]
mod tests;
