//! Bearer access tokens.

use super::AccessDomainError;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

const TOKEN_PREFIX: &str = "mcpg_";
const TOKEN_ENTROPY_BYTES: usize = 32;

/// An opaque bearer credential.
///
/// Generated tokens carry 256 bits from the operating system RNG and are
/// unrelated to any other field of their principal. `Debug` never prints the
/// secret; `Serialize` does, and is only used where the token is handed to
/// its owner.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessToken(String);

impl AccessToken {
    /// Generates a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        let mut secret = [0_u8; TOKEN_ENTROPY_BYTES];
        OsRng.fill_bytes(&mut secret);
        Self(format!("{TOKEN_PREFIX}{}", hex::encode(secret)))
    }

    /// Wraps a token presented by a caller or loaded from storage.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDomainError::EmptyAccessToken`] for blank input.
    pub fn new(value: impl Into<String>) -> Result<Self, AccessDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(AccessDomainError::EmptyAccessToken);
        }
        Ok(Self(normalized))
    }

    /// Returns the secret.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("AccessToken(<redacted>)")
    }
}

impl TryFrom<String> for AccessToken {
    type Error = AccessDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccessToken> for String {
    fn from(value: AccessToken) -> Self {
        value.0
    }
}
