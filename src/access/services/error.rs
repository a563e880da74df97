//! Service-level errors for the authorization layer.

use crate::access::{
    domain::{AccessAction, AccessDomainError, ClientName},
    ports::AccessRepositoryError,
};
use crate::error::GatewayErrorKind;
use thiserror::Error;

/// Errors raised by authorization and client management.
#[derive(Debug, Clone, Error)]
pub enum AccessServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] AccessDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] AccessRepositoryError),

    /// The gateway has not been initialized yet.
    #[error("the gateway is not initialized; run initialization first")]
    NotInitialized,

    /// Production mode requires a bearer token.
    #[error("an access token is required")]
    MissingCredential,

    /// The token matched no administrator or client.
    #[error("the access token is not recognised")]
    InvalidCredential,

    /// The principal may not perform the action.
    #[error("{principal} is not permitted to {action}")]
    Forbidden {
        /// Label of the principal.
        principal: String,
        /// Attempted action.
        action: AccessAction,
    },

    /// No client has this name.
    #[error("client '{0}' not found")]
    ClientNotFound(ClientName),

    /// A client with this name already exists.
    #[error("client '{0}' already exists")]
    ClientAlreadyExists(ClientName),
}

impl AccessServiceError {
    /// Classifies the error for callers.
    #[must_use]
    pub const fn kind(&self) -> GatewayErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::Repository(err) => match err {
                AccessRepositoryError::DuplicateClientName(_) => GatewayErrorKind::Conflict,
                AccessRepositoryError::ClientNotFound(_) => GatewayErrorKind::NotFound,
                AccessRepositoryError::DuplicateToken
                | AccessRepositoryError::InvalidPersistedData(_)
                | AccessRepositoryError::Persistence(_) => GatewayErrorKind::Internal,
            },
            Self::NotInitialized | Self::Forbidden { .. } => GatewayErrorKind::Forbidden,
            Self::MissingCredential | Self::InvalidCredential => {
                GatewayErrorKind::Unauthenticated
            }
            Self::ClientNotFound(_) => GatewayErrorKind::NotFound,
            Self::ClientAlreadyExists(_) => GatewayErrorKind::Conflict,
        }
    }
}

/// Result type for access services.
pub type AccessServiceResult<T> = Result<T, AccessServiceError>;
