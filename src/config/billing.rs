//! Billing provider configuration (Stripe)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Billing provider configuration.
///
/// The secret key and signing secret are injected into the Stripe adapter
/// and the webhook verifier at startup; nothing reads them globally.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Stripe secret API key (`sk_...`)
    pub secret_key: SecretString,

    /// Stripe webhook signing secret (`whsec_...`)
    pub webhook_secret: SecretString,

    /// Price every checkout session subscribes to (`price_...`)
    pub price_id: String,

    /// Frontend base URL for checkout success/cancel redirects
    pub redirect_base_url: String,

    /// Timeout for each Stripe API call in seconds
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,

    /// Override for the Stripe API base URL (tests, proxies)
    pub api_base_url: Option<String>,
}

impl BillingConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.expose_secret().starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.secret_key.expose_secret().starts_with("sk_live_")
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Validate billing configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret_key = self.secret_key.expose_secret();
        let webhook_secret = self.webhook_secret.expose_secret();

        if secret_key.is_empty() {
            return Err(ValidationError::MissingRequired("BILLING__SECRET_KEY"));
        }
        if webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("BILLING__WEBHOOK_SECRET"));
        }
        if self.price_id.is_empty() {
            return Err(ValidationError::MissingRequired("BILLING__PRICE_ID"));
        }

        // Verify key prefixes for safety
        if !secret_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.price_id.starts_with("price_") {
            return Err(ValidationError::InvalidPriceId);
        }

        let redirect = self.redirect_base_url.as_str();
        if !redirect.starts_with("https://") && !redirect.starts_with("http://") {
            return Err(ValidationError::InvalidRedirectBaseUrl);
        }
        if *environment == Environment::Production && !redirect.starts_with("https://") {
            return Err(ValidationError::RedirectMustBeHttps);
        }

        if self.provider_timeout_secs == 0 || self.provider_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }

        Ok(())
    }
}

fn default_provider_timeout() -> u64 {
    10
}
