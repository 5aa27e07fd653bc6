//! HS256 JWT session validator.
//!
//! Validates the access tokens issued by the main application: HMAC-SHA256
//! signed, carrying `user_id`, `email`, and `role` claims with a fixed
//! issuer. Issuance is not part of this crate.
//!
//! # Security
//!
//! - Only HS256 is accepted; the header algorithm is never trusted
//! - Issuer and expiry are always validated
//! - The signing secret is held as `secrecy::SecretString`

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Issuer stamped on tokens by the main application.
pub const DEFAULT_ISSUER: &str = "posting-app";

/// Clock skew tolerated on `exp` unless configured otherwise.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Configuration for HS256 token validation.
#[derive(Clone)]
pub struct JwtConfig {
    secret: SecretString,
    issuer: String,
    /// Allowed clock skew in seconds.
    leeway_secs: u64,
}

impl JwtConfig {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            issuer: DEFAULT_ISSUER.to_string(),
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

/// Claims carried by application access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i64,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    pub iss: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Session validator for HS256 tokens.
pub struct JwtSessionValidator {
    config: JwtConfig,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.validate_exp = true;
        validation.leeway = config.leeway_secs;

        Self {
            config,
            decoding_key,
            validation,
        }
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidIssuer => {
                    tracing::warn!("Invalid issuer in token");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::debug!(error = %e, "Token validation failed");
                    AuthError::InvalidToken
                }
            },
        )?;

        let claims = data.claims;
        let user_id = UserId::new(claims.user_id).map_err(|_| {
            tracing::warn!(user_id = claims.user_id, "Invalid user ID in token");
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(user_id, claims.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-signing-secret";

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(JwtConfig::new(SecretString::new(SECRET.to_string())))
    }

    fn claims(user_id: i64, exp_offset: i64, iss: &str) -> SessionClaims {
        let now = chrono::Utc::now().timestamp();
        SessionClaims {
            user_id,
            email: "ann@example.com".to_string(),
            role: Some("user".to_string()),
            iss: iss.to_string(),
            exp: now + exp_offset,
            iat: Some(now),
        }
    }

    fn sign(claims: &SessionClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn valid_token_resolves_user() {
        let token = sign(&claims(7, 3600, DEFAULT_ISSUER), SECRET);

        let user = validator().validate(&token).await.unwrap();

        assert_eq!(user.id.as_i64(), 7);
        assert_eq!(user.email, "ann@example.com");
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let token = sign(&claims(7, -3600, DEFAULT_ISSUER), SECRET);

        assert_eq!(validator().validate(&token).await.unwrap_err(), AuthError::TokenExpired);
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let token = sign(&claims(7, 3600, DEFAULT_ISSUER), "another-secret");

        assert_eq!(validator().validate(&token).await.unwrap_err(), AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn wrong_issuer_is_invalid() {
        let token = sign(&claims(7, 3600, "someone-else"), SECRET);

        assert_eq!(validator().validate(&token).await.unwrap_err(), AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn non_positive_user_id_is_invalid() {
        let token = sign(&claims(0, 3600, DEFAULT_ISSUER), SECRET);

        assert_eq!(validator().validate(&token).await.unwrap_err(), AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        assert_eq!(
            validator().validate("not.a.jwt").await.unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[tokio::test]
    async fn leeway_decides_recently_expired_tokens() {
        let token = sign(&claims(7, -20, DEFAULT_ISSUER), SECRET);

        let lenient = JwtSessionValidator::new(
            JwtConfig::new(SecretString::new(SECRET.to_string())).with_leeway(60),
        );
        assert!(lenient.validate(&token).await.is_ok());

        let strict = JwtSessionValidator::new(
            JwtConfig::new(SecretString::new(SECRET.to_string())).with_leeway(0),
        );
        assert_eq!(strict.validate(&token).await.unwrap_err(), AuthError::TokenExpired);
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", validator());
        assert!(!rendered.contains(SECRET));
    }

    #[test]
    fn validator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JwtSessionValidator>();
    }
}
