//! Domain model for deployment modes, principals, and credentials.

mod admin;
mod client;
mod error;
mod mode;
mod principal;
mod token;

pub use admin::{AdminUser, DEFAULT_ADMIN_USERNAME, PersistedAdminUserData, UserRole};
pub use client::{AllowList, ClientName, McpClient, PersistedMcpClientData, ServerAccessPolicy};
pub use error::AccessDomainError;
pub use mode::{ServerConfiguration, ServerMode};
pub use principal::{AccessAction, Principal};
pub use token::AccessToken;
