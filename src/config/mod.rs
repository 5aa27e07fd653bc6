//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `ENTITLEMENT_SYNC`
//! prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use entitlement_sync::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod billing;
mod database;
mod error;
mod reconciliation;
mod server;

pub use auth::{AuthConfig, MIN_JWT_SECRET_BYTES};
pub use billing::BillingConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use reconciliation::{ReconciliationConfig, MIN_SWEEP_INTERVAL_SECS};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Billing provider configuration (Stripe)
    pub billing: BillingConfig,

    /// Reconciliation sweep schedule
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,

    /// Session token validation
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `ENTITLEMENT_SYNC` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `ENTITLEMENT_SYNC__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ENTITLEMENT_SYNC__BILLING__SECRET_KEY=...` -> `billing.secret_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or a value
    /// cannot be parsed into its expected type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ENTITLEMENT_SYNC")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.billing.validate(&self.server.environment)?;
        self.reconciliation.validate()?;
        self.auth.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize the tests touching them
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const REQUIRED: &[(&str, &str)] = &[
        ("ENTITLEMENT_SYNC__DATABASE__URL", "postgresql://test@localhost/test"),
        ("ENTITLEMENT_SYNC__BILLING__SECRET_KEY", "sk_test_xxx"),
        ("ENTITLEMENT_SYNC__BILLING__WEBHOOK_SECRET", "whsec_xxx"),
        ("ENTITLEMENT_SYNC__BILLING__PRICE_ID", "price_xxx"),
        ("ENTITLEMENT_SYNC__BILLING__REDIRECT_BASE_URL", "http://localhost:3000"),
        ("ENTITLEMENT_SYNC__AUTH__JWT_SECRET", "0123456789abcdef0123456789abcdef"),
    ];

    const OPTIONAL: &[&str] = &[
        "ENTITLEMENT_SYNC__SERVER__PORT",
        "ENTITLEMENT_SYNC__SERVER__ENVIRONMENT",
        "ENTITLEMENT_SYNC__RECONCILIATION__INTERVAL_SECS",
        "ENTITLEMENT_SYNC__RECONCILIATION__ENABLED",
    ];

    fn set_minimal_env() {
        for (key, value) in REQUIRED {
            env::set_var(key, value);
        }
    }

    fn clear_env() {
        for (key, _) in REQUIRED {
            env::remove_var(key);
        }
        for key in OPTIONAL {
            env::remove_var(key);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let config = load_with(&[]).expect("config should load");

        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.billing.secret_key.expose_secret(), "sk_test_xxx");
        assert_eq!(config.billing.price_id, "price_xxx");
        assert_eq!(config.auth.issuer, "posting-app");
        assert_eq!(config.auth.leeway_secs, 30);
    }

    #[test]
    fn test_validate_full_config() {
        let config = load_with(&[]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert!(config.reconciliation.enabled);
        assert_eq!(config.reconciliation.interval_secs, 3600);
        assert_eq!(config.billing.provider_timeout_secs, 10);
    }

    #[test]
    fn test_overrides() {
        let config = load_with(&[
            ("ENTITLEMENT_SYNC__SERVER__PORT", "3000"),
            ("ENTITLEMENT_SYNC__RECONCILIATION__INTERVAL_SECS", "120"),
            ("ENTITLEMENT_SYNC__RECONCILIATION__ENABLED", "false"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.reconciliation.interval_secs, 120);
        assert!(!config.reconciliation.enabled);
    }

    #[test]
    fn test_production_requires_https_redirect() {
        let config = load_with(&[("ENTITLEMENT_SYNC__SERVER__ENVIRONMENT", "production")]).unwrap();

        assert!(config.is_production());
        assert_eq!(config.validate(), Err(ValidationError::RedirectMustBeHttps));
    }

    #[test]
    fn test_short_sweep_interval_fails_validation() {
        let config =
            load_with(&[("ENTITLEMENT_SYNC__RECONCILIATION__INTERVAL_SECS", "10")]).unwrap();

        assert_eq!(
            config.validate(),
            Err(ValidationError::SweepIntervalTooShort { min: 60 })
        );
    }
}
