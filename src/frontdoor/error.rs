//! Unified error surface for inbound actions.

use crate::access::{domain::AccessDomainError, services::AccessServiceError};
use crate::error::GatewayErrorKind;
use crate::registry::{domain::RegistryDomainError, services::GatewayServiceError};
use thiserror::Error;

const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Any failure of an authorized gateway action.
#[derive(Debug, Clone, Error)]
pub enum FrontdoorError {
    /// Authentication, authorization, or client management failed.
    #[error(transparent)]
    Access(#[from] AccessServiceError),

    /// The gateway operation failed.
    #[error(transparent)]
    Gateway(#[from] GatewayServiceError),
}

impl FrontdoorError {
    /// Classifies the error for callers.
    #[must_use]
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            Self::Access(err) => err.kind(),
            Self::Gateway(err) => err.kind(),
        }
    }

    /// Returns the HTTP status a request router should answer with.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.kind().http_status()
    }

    /// Returns the message safe to show the caller.
    ///
    /// Internal failures are reduced to a generic message; their details
    /// only reach the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.kind().is_public() {
            self.to_string()
        } else {
            INTERNAL_ERROR_MESSAGE.to_owned()
        }
    }
}

impl From<RegistryDomainError> for FrontdoorError {
    fn from(err: RegistryDomainError) -> Self {
        Self::Gateway(GatewayServiceError::Domain(err))
    }
}

impl From<AccessDomainError> for FrontdoorError {
    fn from(err: AccessDomainError) -> Self {
        Self::Access(AccessServiceError::Domain(err))
    }
}

/// Result type for authorized gateway actions.
pub type FrontdoorResult<T> = Result<T, FrontdoorError>;
