//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` port against the Stripe REST API.
//!
//! # Security
//!
//! - The secret key is held as `secrecy::SecretString` and only exposed to
//!   build the basic-auth header
//! - Every request is bounded by the client-level timeout
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(secret_key).with_timeout(Duration::from_secs(10));
//! let provider = StripeBillingProvider::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::ports::{
    BillingProvider, CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest,
    ProviderCustomer, ProviderError, ProviderSubscription,
};

use super::api_types::{
    StripeCheckoutSession, StripeCustomer, StripeErrorEnvelope, StripeSubscriptionList,
};

/// Default Stripe API host.
pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Page size for subscription listing (Stripe's maximum).
const SUBSCRIPTION_PAGE_SIZE: &str = "100";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    secret_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Upper bound for any single provider call.
    timeout: Duration,
}

impl StripeConfig {
    /// Create a new Stripe configuration with a 10 second timeout.
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            secret_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Stripe billing provider.
pub struct StripeBillingProvider {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeBillingProvider {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        params: &[(&str, String)],
        idempotency_key: Option<&str>,
    ) -> Result<T, ProviderError> {
        let mut request = self
            .http_client
            .post(self.url(path))
            .basic_auth(self.config.secret_key.expose_secret(), Option::<&str>::None)
            .form(params);

        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request.send().await.map_err(transport_error)?;
        decode_response(operation, response).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let response = self
            .http_client
            .get(self.url(path))
            .basic_auth(self.config.secret_key.expose_secret(), Option::<&str>::None)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        decode_response(operation, response).await
    }
}

#[async_trait]
impl BillingProvider for StripeBillingProvider {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<ProviderCustomer, ProviderError> {
        let params = customer_params(&request);
        let customer: StripeCustomer = self
            .post_form(
                "create_customer",
                "/v1/customers",
                &params,
                request.idempotency_key.as_deref(),
            )
            .await?;

        tracing::debug!(user_id = %request.user_id, customer_ref = %customer.id, "Stripe customer created");

        Ok(ProviderCustomer {
            id: customer.id,
            email: customer.email.or(Some(request.email)),
        })
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, ProviderError> {
        let params = checkout_params(&request);
        let session: StripeCheckoutSession = self
            .post_form("create_checkout_session", "/v1/checkout/sessions", &params, None)
            .await?;

        let url = session
            .url
            .ok_or_else(|| ProviderError::provider("checkout session has no redirect url"))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn list_subscriptions(
        &self,
        customer_ref: &str,
    ) -> Result<Vec<ProviderSubscription>, ProviderError> {
        let mut subscriptions = Vec::new();
        let mut starting_after: Option<String> = None;

        loop {
            let mut query = vec![
                ("customer", customer_ref.to_string()),
                ("status", "all".to_string()),
                ("limit", SUBSCRIPTION_PAGE_SIZE.to_string()),
            ];
            if let Some(cursor) = &starting_after {
                query.push(("starting_after", cursor.clone()));
            }

            let page: StripeSubscriptionList = self
                .get("list_subscriptions", "/v1/subscriptions", &query)
                .await?;

            starting_after = page.data.last().map(|s| s.id.clone());
            let has_more = page.has_more && starting_after.is_some();

            subscriptions.extend(
                page.data
                    .into_iter()
                    .map(|s| s.into_provider_subscription()),
            );

            if !has_more {
                break;
            }
        }

        Ok(subscriptions)
    }
}

/// Form body for `POST /v1/customers`.
fn customer_params(request: &CreateCustomerRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("email", request.email.clone()),
        ("metadata[user_id]", request.user_id.to_string()),
    ];
    if let Some(name) = &request.name {
        params.push(("name", name.clone()));
    }
    params
}

/// Form body for `POST /v1/checkout/sessions`.
fn checkout_params(request: &CreateCheckoutRequest) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "subscription".to_string()),
        ("customer", request.customer_ref.clone()),
        ("line_items[0][price]", request.price_id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("client_reference_id", request.user_id.to_string()),
        ("metadata[user_id]", request.user_id.to_string()),
    ]
}

fn transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::timeout(error.to_string())
    } else {
        ProviderError::network(error.to_string())
    }
}

async fn decode_response<T: DeserializeOwned>(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let error = status_error(status, &body);
        tracing::error!(operation, status = status.as_u16(), error = %error, "Stripe request failed");
        return Err(error);
    }

    response.json().await.map_err(|e| {
        ProviderError::provider(format!("Failed to parse Stripe response: {}", e))
    })
}

/// Map a non-2xx response onto a provider error.
fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<StripeErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| format!("Stripe API error ({})", status.as_u16()));

    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::authentication(message),
        StatusCode::NOT_FOUND => ProviderError::not_found(&message),
        StatusCode::REQUEST_TIMEOUT => ProviderError::timeout(message),
        s if s.is_client_error() => ProviderError::invalid_request(message),
        _ => ProviderError::provider(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::ports::ProviderErrorCode;

    fn test_config() -> StripeConfig {
        StripeConfig::new(SecretString::new("sk_test_123".to_string()))
    }

    fn user() -> UserId {
        UserId::new(42).unwrap()
    }

    #[test]
    fn config_new_sets_defaults() {
        let config = test_config();
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn config_with_base_url_strips_trailing_slash() {
        let config = test_config().with_base_url("http://localhost:12111/");
        assert_eq!(config.api_base_url(), "http://localhost:12111");
    }

    #[test]
    fn config_debug_redacts_secret() {
        let rendered = format!("{:?}", test_config());
        assert!(!rendered.contains("sk_test_123"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn adapter_builds_with_timeout() {
        let provider =
            StripeBillingProvider::new(test_config().with_timeout(Duration::from_secs(3)));
        assert!(provider.is_ok());
    }

    #[test]
    fn customer_params_carry_user_metadata() {
        let params = customer_params(&CreateCustomerRequest {
            user_id: user(),
            email: "ann@example.com".to_string(),
            name: Some("ann".to_string()),
            idempotency_key: Some("customer-42".to_string()),
        });

        assert!(params.contains(&("email", "ann@example.com".to_string())));
        assert!(params.contains(&("metadata[user_id]", "42".to_string())));
        assert!(params.contains(&("name", "ann".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "idempotency_key"));
    }

    #[test]
    fn checkout_params_bind_customer_price_and_user() {
        let params = checkout_params(&CreateCheckoutRequest {
            user_id: user(),
            customer_ref: "cus_1".to_string(),
            price_id: "price_monthly".to_string(),
            success_url: "https://app.test/subscription/success".to_string(),
            cancel_url: "https://app.test/subscription/cancel".to_string(),
        });

        assert!(params.contains(&("mode", "subscription".to_string())));
        assert!(params.contains(&("customer", "cus_1".to_string())));
        assert!(params.contains(&("line_items[0][price]", "price_monthly".to_string())));
        assert!(params.contains(&("client_reference_id", "42".to_string())));
        assert!(params.contains(&("metadata[user_id]", "42".to_string())));
    }

    #[test]
    fn rate_limit_is_retryable() {
        let error = status_error(StatusCode::TOO_MANY_REQUESTS, "");
        assert_eq!(error.code, ProviderErrorCode::RateLimitExceeded);
        assert!(error.retryable);
    }

    #[test]
    fn server_errors_are_retryable() {
        let error = status_error(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(error.code, ProviderErrorCode::ProviderError);
        assert!(error.retryable);
        assert!(error.message.contains("502"));
    }

    #[test]
    fn client_errors_use_stripe_message() {
        let body = r#"{"error": {"type": "invalid_request_error", "message": "No such price: 'price_x'"}}"#;
        let error = status_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(error.code, ProviderErrorCode::InvalidRequest);
        assert!(!error.retryable);
        assert_eq!(error.message, "No such price: 'price_x'");
    }

    #[test]
    fn unauthorized_maps_to_authentication() {
        let error = status_error(StatusCode::UNAUTHORIZED, "{}");
        assert_eq!(error.code, ProviderErrorCode::AuthenticationError);
    }
}
