//! Authorization and client-management services.

mod authorization;
mod clients;
mod error;

pub use authorization::{AuthorizationService, InitOutcome, IssuedAdminCredential, authorize};
pub use clients::{ClientService, CreateClientRequest, IssuedClient};
pub use error::{AccessServiceError, AccessServiceResult};
