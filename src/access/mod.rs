//! Authorization layer: deployment mode, principals, and allow-lists.
//!
//! The gateway starts uninitialized. A one-shot initialization fixes the
//! mode: development mode trusts every caller, production mode resolves a
//! bearer token to an administrator or a scoped client.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
