//! Billing provider port for the external subscription platform.
//!
//! Only the three calls the entitlement engine needs: create a customer,
//! open a hosted checkout, and list a customer's subscriptions. Every call
//! is fallible and implementations must bound it with a timeout.

use crate::domain::entitlement::EntitlementError;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for billing provider integrations.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Create a customer in the billing system.
    ///
    /// Returns the provider's customer ID for future reference.
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<ProviderCustomer, ProviderError>;

    /// Create a hosted checkout session for a subscription.
    ///
    /// Returns a URL for the customer to complete payment.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, ProviderError>;

    /// List every subscription the provider holds for a customer, in any status.
    async fn list_subscriptions(
        &self,
        customer_ref: &str,
    ) -> Result<Vec<ProviderSubscription>, ProviderError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    /// Internal user ID (stored as metadata).
    pub user_id: UserId,
    /// Customer email address.
    pub email: String,
    /// Customer display name.
    pub name: Option<String>,
    /// Idempotency key for safe retries.
    pub idempotency_key: Option<String>,
}

/// Customer in the billing system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCustomer {
    /// Provider's customer ID.
    pub id: String,
    pub email: Option<String>,
}

/// Request to create a checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Internal user ID, echoed back on the completed session.
    pub user_id: UserId,
    /// Provider customer the session is bound to.
    pub customer_ref: String,
    /// Configured price/plan identifier.
    pub price_id: String,
    /// URL to redirect after successful checkout.
    pub success_url: String,
    /// URL to redirect after canceled checkout.
    pub cancel_url: String,
}

/// Checkout session for payment completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID.
    pub id: String,
    /// URL for customer to complete checkout.
    pub url: String,
}

/// A subscription as the provider currently reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSubscription {
    /// Provider's subscription ID.
    pub id: String,
    /// Provider's customer ID.
    pub customer_ref: String,
    /// Raw provider status, translated by the status mapper.
    pub status: String,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    /// When the provider created the subscription. Picks the authoritative one.
    pub created: Timestamp,
}

/// Errors from billing provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    /// Error code for categorization.
    pub code: ProviderErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl ProviderError {
    /// Create a new provider error.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Timeout, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimitExceeded, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidRequest, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationError, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(ProviderErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for DomainError {
    fn from(err: ProviderError) -> Self {
        DomainError::new(ErrorCode::ProviderError, err.message)
            .with_detail("provider_code", err.code.to_string())
    }
}

impl From<ProviderError> for EntitlementError {
    fn from(err: ProviderError) -> Self {
        // Nothing is persisted before a provider call succeeds, so every
        // provider failure is safe for the caller to retry.
        EntitlementError::provider_unavailable(err.to_string())
    }
}

/// Provider error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// The call exceeded its timeout.
    Timeout,

    /// API authentication failed (bad secret key).
    AuthenticationError,

    /// The provider rejected the request parameters.
    InvalidRequest,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Provider-side 5xx.
    ProviderError,
}

impl ProviderErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorCode::NetworkError
                | ProviderErrorCode::Timeout
                | ProviderErrorCode::RateLimitExceeded
                | ProviderErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderErrorCode::NetworkError => "network_error",
            ProviderErrorCode::Timeout => "timeout",
            ProviderErrorCode::AuthenticationError => "authentication_error",
            ProviderErrorCode::InvalidRequest => "invalid_request",
            ProviderErrorCode::NotFound => "not_found",
            ProviderErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            ProviderErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn billing_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn BillingProvider) {}
    }

    #[test]
    fn provider_error_retryable() {
        assert!(ProviderErrorCode::NetworkError.is_retryable());
        assert!(ProviderErrorCode::Timeout.is_retryable());
        assert!(ProviderErrorCode::RateLimitExceeded.is_retryable());
        assert!(ProviderErrorCode::ProviderError.is_retryable());

        assert!(!ProviderErrorCode::InvalidRequest.is_retryable());
        assert!(!ProviderErrorCode::AuthenticationError.is_retryable());
        assert!(!ProviderErrorCode::NotFound.is_retryable());
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::timeout("list subscriptions took too long");
        assert_eq!(err.to_string(), "timeout: list subscriptions took too long");
        assert!(err.retryable);
    }

    #[test]
    fn provider_error_converts_to_domain_error() {
        let domain: DomainError = ProviderError::not_found("customer").into();
        assert_eq!(domain.code, ErrorCode::ProviderError);
        assert_eq!(
            domain.details.get("provider_code"),
            Some(&"not_found".to_string())
        );
    }

    #[test]
    fn any_provider_error_is_transient_for_callers() {
        let err: EntitlementError = ProviderError::invalid_request("No such price").into();
        assert!(matches!(err, EntitlementError::ProviderUnavailable(_)));
        assert!(err.is_retryable());
    }
}
