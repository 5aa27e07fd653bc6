//! Authentication types for the domain layer.
//!
//! `AuthenticatedUser` is what a validated bearer token resolves to. Token
//! issuance lives elsewhere; this crate only consumes the identity through
//! the `SessionValidator` port.

use super::UserId;
use thiserror::Error;

/// Authenticated caller extracted from a validated access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Local user id carried in the token claims.
    pub id: UserId,

    /// Email claim, used only for logging and provider customer creation hints.
    pub email: String,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired (separate from InvalidToken for specific handling).
    #[error("Token expired")]
    TokenExpired,

    /// The validator could not run (bad key material, misconfiguration).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this error indicates the user should re-authenticate.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::TokenExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticated_user_new_creates_user() {
        let user = AuthenticatedUser::new(UserId::new(12).unwrap(), "test@example.com");

        assert_eq!(user.id.as_i64(), 12);
        assert_eq!(user.email, "test@example.com");
    }

    #[test]
    fn auth_error_displays_correctly() {
        assert_eq!(AuthError::InvalidToken.to_string(), "Invalid or expired token");
        assert_eq!(AuthError::TokenExpired.to_string(), "Token expired");
        assert_eq!(
            AuthError::service_unavailable("bad key").to_string(),
            "Auth service unavailable: bad key"
        );
    }

    #[test]
    fn auth_error_requires_reauthentication_for_token_errors() {
        assert!(AuthError::InvalidToken.requires_reauthentication());
        assert!(AuthError::TokenExpired.requires_reauthentication());
        assert!(!AuthError::service_unavailable("").requires_reauthentication());
    }
}
