//! Stripe REST response shapes used by the billing adapter.
//!
//! Only the fields the adapter reads are declared; serde ignores the rest.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::ports::ProviderSubscription;

/// Stripe Customer object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCustomer {
    /// Unique customer identifier (cus_...).
    pub id: String,

    /// Customer email address.
    pub email: Option<String>,
}

/// Stripe Checkout Session object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCheckoutSession {
    /// Unique session identifier (cs_...).
    pub id: String,

    /// Hosted payment page. Absent once the session has expired.
    pub url: Option<String>,
}

/// Page of subscriptions returned by `GET /v1/subscriptions`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscriptionList {
    #[serde(default)]
    pub data: Vec<StripeSubscription>,

    #[serde(default)]
    pub has_more: bool,
}

/// Stripe Subscription object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscription {
    /// Unique subscription identifier (sub_...).
    pub id: String,

    /// Customer ID owning this subscription.
    pub customer: String,

    /// Raw subscription status.
    pub status: String,

    /// Unix timestamp of creation.
    pub created: i64,

    /// Newer API versions only report period bounds on the items.
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,

    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

/// Subscription items container.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

/// Single subscription item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscriptionItem {
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

impl StripeSubscription {
    /// Period bounds from the subscription, falling back to its first item.
    pub fn period(&self) -> Option<(i64, i64)> {
        let item = self.items.data.first();
        let start = self
            .current_period_start
            .or_else(|| item.and_then(|i| i.current_period_start))?;
        let end = self
            .current_period_end
            .or_else(|| item.and_then(|i| i.current_period_end))?;
        Some((start, end))
    }

    /// Convert into the port representation.
    ///
    /// A subscription without period bounds (e.g. `incomplete`) gets an empty
    /// period anchored at its creation time.
    pub fn into_provider_subscription(self) -> ProviderSubscription {
        let (start, end) = self.period().unwrap_or((self.created, self.created));
        ProviderSubscription {
            id: self.id,
            customer_ref: self.customer,
            status: self.status,
            current_period_start: Timestamp::from_unix_secs(start),
            current_period_end: Timestamp::from_unix_secs(end),
            created: Timestamp::from_unix_secs(self.created),
        }
    }
}

/// Error envelope returned by Stripe on non-2xx responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeErrorEnvelope {
    pub error: StripeErrorBody,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeErrorBody {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}
