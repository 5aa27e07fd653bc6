//! Typed provider webhook events.
//!
//! The envelope `{ id, type, created, livemode, data: { object } }` is
//! decoded in two steps: first the envelope with an untyped object, then
//! the object into the payload type that belongs to the event type. A known
//! type whose object has the wrong shape is a validation failure; an
//! unknown type decodes to [`ProviderEventKind::Unhandled`].

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::webhook_errors::WebhookError;
use crate::domain::foundation::{Timestamp, UserId};

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const SUBSCRIPTION_CREATED: &str = "customer.subscription.created";
pub const SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
pub const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";
pub const INVOICE_PAYMENT_FAILED: &str = "invoice.payment_failed";

/// A verified, decoded webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEvent {
    /// Provider event id (`evt_...`), used for delivery de-duplication.
    pub id: String,
    pub created: Timestamp,
    pub livemode: bool,
    pub kind: ProviderEventKind,
}

/// Closed set of events this system acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEventKind {
    CheckoutCompleted(CheckoutCompleted),
    SubscriptionCreated(SubscriptionChanged),
    SubscriptionUpdated(SubscriptionChanged),
    SubscriptionDeleted(SubscriptionChanged),
    PaymentFailed(PaymentFailed),
    /// Any other event type. Acknowledged and ignored.
    Unhandled(String),
}

impl ProviderEventKind {
    /// The provider's type tag for this event.
    pub fn type_name(&self) -> &str {
        match self {
            ProviderEventKind::CheckoutCompleted(_) => CHECKOUT_SESSION_COMPLETED,
            ProviderEventKind::SubscriptionCreated(_) => SUBSCRIPTION_CREATED,
            ProviderEventKind::SubscriptionUpdated(_) => SUBSCRIPTION_UPDATED,
            ProviderEventKind::SubscriptionDeleted(_) => SUBSCRIPTION_DELETED,
            ProviderEventKind::PaymentFailed(_) => INVOICE_PAYMENT_FAILED,
            ProviderEventKind::Unhandled(event_type) => event_type,
        }
    }
}

/// Hosted checkout finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCompleted {
    pub session_id: String,
    pub customer_ref: Option<String>,
    /// Local user recorded on the session when it was issued.
    pub user_id: Option<UserId>,
    pub subscription_ref: Option<String>,
}

/// A subscription object was created, changed, or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionChanged {
    pub subscription_ref: String,
    pub customer_ref: String,
    pub provider_status: String,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
}

/// An invoice payment attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFailed {
    pub invoice_id: String,
    pub customer_ref: String,
    pub subscription_ref: Option<String>,
}

impl ProviderEvent {
    /// Decodes a raw, already verified payload.
    pub fn decode(payload: &[u8]) -> Result<Self, WebhookError> {
        let envelope: Envelope = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::MalformedPayload(format!("envelope: {}", e)))?;

        let kind = match envelope.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => {
                let session: WireCheckoutSession = decode_object(&envelope)?;
                ProviderEventKind::CheckoutCompleted(session.into_payload())
            }
            SUBSCRIPTION_CREATED => {
                ProviderEventKind::SubscriptionCreated(decode_subscription(&envelope)?)
            }
            SUBSCRIPTION_UPDATED => {
                ProviderEventKind::SubscriptionUpdated(decode_subscription(&envelope)?)
            }
            SUBSCRIPTION_DELETED => {
                ProviderEventKind::SubscriptionDeleted(decode_subscription(&envelope)?)
            }
            INVOICE_PAYMENT_FAILED => {
                let invoice: WireInvoice = decode_object(&envelope)?;
                ProviderEventKind::PaymentFailed(PaymentFailed {
                    invoice_id: invoice.id,
                    customer_ref: invoice.customer,
                    subscription_ref: invoice.subscription,
                })
            }
            other => ProviderEventKind::Unhandled(other.to_string()),
        };

        Ok(ProviderEvent {
            id: envelope.id,
            created: Timestamp::from_unix_secs(envelope.created),
            livemode: envelope.livemode,
            kind,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    #[serde(default)]
    livemode: bool,
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: serde_json::Value,
}

fn decode_object<T: DeserializeOwned>(envelope: &Envelope) -> Result<T, WebhookError> {
    T::deserialize(&envelope.data.object).map_err(|e| {
        WebhookError::MalformedPayload(format!("{} object: {}", envelope.event_type, e))
    })
}

fn decode_subscription(envelope: &Envelope) -> Result<SubscriptionChanged, WebhookError> {
    let subscription: WireSubscription = decode_object(envelope)?;
    subscription.into_payload()
}

#[derive(Debug, Deserialize)]
struct WireCheckoutSession {
    id: String,
    customer: Option<String>,
    subscription: Option<String>,
    client_reference_id: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl WireCheckoutSession {
    fn into_payload(self) -> CheckoutCompleted {
        let user_id = self
            .metadata
            .get("user_id")
            .or(self.client_reference_id.as_ref())
            .and_then(|raw| raw.parse::<UserId>().ok());

        CheckoutCompleted {
            session_id: self.id,
            customer_ref: self.customer,
            user_id,
            subscription_ref: self.subscription,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSubscription {
    id: String,
    customer: String,
    status: String,
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
    #[serde(default)]
    items: Option<WireSubscriptionItems>,
}

#[derive(Debug, Deserialize)]
struct WireSubscriptionItems {
    #[serde(default)]
    data: Vec<WireSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct WireSubscriptionItem {
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
}

impl WireSubscription {
    fn into_payload(self) -> Result<SubscriptionChanged, WebhookError> {
        // Newer API versions report the period on the first item instead.
        let first_item = self.items.as_ref().and_then(|items| items.data.first());
        let start = self
            .current_period_start
            .or_else(|| first_item.and_then(|i| i.current_period_start))
            .ok_or(WebhookError::MissingField("current_period_start"))?;
        let end = self
            .current_period_end
            .or_else(|| first_item.and_then(|i| i.current_period_end))
            .ok_or(WebhookError::MissingField("current_period_end"))?;

        Ok(SubscriptionChanged {
            subscription_ref: self.id,
            customer_ref: self.customer,
            provider_status: self.status,
            current_period_start: Timestamp::from_unix_secs(start),
            current_period_end: Timestamp::from_unix_secs(end),
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireInvoice {
    id: String,
    customer: String,
    subscription: Option<String>,
}
