//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Minimum HS256 secret length accepted.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Largest expiry leeway accepted.
pub const MAX_LEEWAY_SECS: u64 = 300;

/// Session token validation settings (HS256)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret tokens are signed with
    pub jwt_secret: SecretString,

    /// Expected `iss` claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Clock skew tolerated on token expiry, in seconds
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ValidationError::JwtSecretTooShort {
                min: MIN_JWT_SECRET_BYTES,
            });
        }
        if self.issuer.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__ISSUER"));
        }
        if self.leeway_secs > MAX_LEEWAY_SECS {
            return Err(ValidationError::LeewayTooLarge {
                max: MAX_LEEWAY_SECS,
            });
        }
        Ok(())
    }
}

fn default_issuer() -> String {
    crate::adapters::auth::DEFAULT_ISSUER.to_string()
}

fn default_leeway_secs() -> u64 {
    crate::adapters::auth::DEFAULT_LEEWAY_SECS
}
