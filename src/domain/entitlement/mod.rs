//! Entitlement domain module.
//!
//! What a user's paid entitlement is, how provider vocabulary maps onto it,
//! and how provider webhook deliveries are authenticated and decoded.
//!
//! # Module Structure
//!
//! - `status` - SubscriptionStatus, the four stored states
//! - `status_mapper` - provider status to internal status
//! - `account` - billing fields of a user
//! - `subscription` - subscription records and atomic store writes
//! - `provider_event` - typed webhook events
//! - `webhook_verifier` - signature verification
//! - `errors`, `webhook_errors` - error taxonomy

mod account;
mod errors;
mod provider_event;
mod status;
mod status_mapper;
mod subscription;
mod webhook_errors;
mod webhook_verifier;

pub use account::BillingAccount;
pub use errors::EntitlementError;
pub use provider_event::{
    CheckoutCompleted, PaymentFailed, ProviderEvent, ProviderEventKind, SubscriptionChanged,
    CHECKOUT_SESSION_COMPLETED, INVOICE_PAYMENT_FAILED, SUBSCRIPTION_CREATED,
    SUBSCRIPTION_DELETED, SUBSCRIPTION_UPDATED,
};
pub use status::SubscriptionStatus;
pub use status_mapper::{map_provider_status, ProviderSignal};
pub use subscription::{EntitlementChange, SubscriptionRecord, SubscriptionSnapshot};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{SignatureHeader, WebhookVerifier};
