//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid Stripe API key format")]
    InvalidStripeKey,

    #[error("Invalid Stripe webhook secret format")]
    InvalidStripeWebhookSecret,

    #[error("Invalid Stripe price ID format")]
    InvalidPriceId,

    #[error("Redirect base URL must be an absolute http(s) URL")]
    InvalidRedirectBaseUrl,

    #[error("Redirect base URL must use HTTPS in production")]
    RedirectMustBeHttps,

    #[error("Reconciliation interval must be at least {min} seconds")]
    SweepIntervalTooShort { min: u64 },

    #[error("JWT signing secret must be at least {min} bytes")]
    JwtSecretTooShort { min: usize },

    #[error("JWT expiry leeway must be at most {max} seconds")]
    LeewayTooLarge { max: u64 },
}
