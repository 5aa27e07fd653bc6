//! HTTP DTOs (Data Transfer Objects) for entitlement endpoints.
//!
//! These types define the JSON request/response structure for the
//! subscription and content API. They are the boundary between HTTP and
//! the application layer.

use serde::{Deserialize, Serialize};

use crate::application::handlers::entitlement::{
    GetSubscriptionStatusResult, IssueCheckoutSessionResult,
};
use crate::domain::entitlement::{SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::Timestamp;
use crate::ports::ContentRef;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a post.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

/// Request to reply to a post. The post id comes from the path.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReplyRequest {
    pub content: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for a newly issued checkout session.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSessionResponse {
    /// Hosted checkout page to redirect the user to.
    pub checkout_url: String,
    pub session_id: String,
}

impl From<IssueCheckoutSessionResult> for CheckoutSessionResponse {
    fn from(result: IssueCheckoutSessionResult) -> Self {
        Self {
            checkout_url: result.checkout_url,
            session_id: result.session_id,
        }
    }
}

/// Acknowledgement returned to the billing provider.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
}

impl WebhookAckResponse {
    pub fn received() -> Self {
        Self { received: true }
    }
}

/// The caller's entitlement view.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatusResponse {
    pub user_id: i64,
    pub status: SubscriptionStatus,
    /// Whether gated actions are currently allowed.
    pub entitled: bool,
    pub has_billing_customer: bool,
    pub current_subscription: Option<SubscriptionRecordResponse>,
}

impl From<GetSubscriptionStatusResult> for SubscriptionStatusResponse {
    fn from(result: GetSubscriptionStatusResult) -> Self {
        Self {
            user_id: result.user_id.as_i64(),
            status: result.status,
            entitled: result.entitled,
            has_billing_customer: result.has_billing_customer,
            current_subscription: result.current_subscription.map(Into::into),
        }
    }
}

/// Stored subscription record for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRecordResponse {
    pub provider_subscription_ref: String,
    pub status: SubscriptionStatus,
    /// Start of current billing period (ISO 8601).
    pub current_period_start: String,
    /// End of current billing period (ISO 8601).
    pub current_period_end: String,
    pub updated_at: String,
}

fn iso8601(ts: &Timestamp) -> String {
    ts.as_datetime().to_rfc3339()
}

impl From<SubscriptionRecord> for SubscriptionRecordResponse {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            current_period_start: iso8601(&record.current_period_start),
            current_period_end: iso8601(&record.current_period_end),
            updated_at: iso8601(&record.updated_at),
            provider_subscription_ref: record.provider_subscription_ref,
            status: record.status,
        }
    }
}

/// Id of a created post or reply.
#[derive(Debug, Clone, Serialize)]
pub struct ContentCreatedResponse {
    pub id: i64,
}

impl From<ContentRef> for ContentCreatedResponse {
    fn from(created: ContentRef) -> Self {
        Self { id: created.id }
    }
}

/// Liveness probe body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
