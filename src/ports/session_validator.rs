//! Session validation port for bearer token validation.
//!
//! Token issuance belongs to the auth service; this crate only needs to know
//! who is calling. Implementations validate signature, issuer, and expiry.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts user identity.
///
/// # Contract
///
/// Implementations must:
/// - Validate the token signature
/// - Validate issuer and expiry claims
/// - Return `AuthError::InvalidToken` for malformed/bad signature tokens
/// - Return `AuthError::TokenExpired` for expired tokens
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use std::collections::HashMap;

    struct TestSessionValidator {
        tokens: HashMap<String, AuthenticatedUser>,
    }

    #[async_trait]
    impl SessionValidator for TestSessionValidator {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            self.tokens.get(token).cloned().ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn validator_works_through_trait_object() {
        let mut tokens = HashMap::new();
        tokens.insert(
            "good".to_string(),
            AuthenticatedUser::new(UserId::new(3).unwrap(), "c@example.com"),
        );
        let validator: Box<dyn SessionValidator> = Box::new(TestSessionValidator { tokens });

        assert_eq!(validator.validate("good").await.unwrap().id.as_i64(), 3);
        assert_eq!(
            validator.validate("bad").await.unwrap_err(),
            AuthError::InvalidToken
        );
    }
}
