//! Entitlement handlers.
//!
//! Command and query handlers that keep local entitlement state in step
//! with the billing provider:
//!
//! ## Commands
//! - Issuing checkout sessions
//! - Processing provider webhooks
//! - Reconciling every customer against the provider (plus its scheduler)
//! - Creating posts and replies behind the entitlement gate
//!
//! ## Queries
//! - Entitlement gate checks
//! - Subscription status for the current user

mod create_content;
mod entitlement_gate;
mod get_subscription_status;
mod handle_provider_webhook;
mod issue_checkout_session;
mod reconcile_entitlements;
mod reconciliation_scheduler;

// Commands
pub use create_content::{
    CreatePostCommand, CreatePostHandler, CreateReplyCommand, CreateReplyHandler, CREATE_POSTS,
    CREATE_REPLIES,
};
pub use handle_provider_webhook::{
    HandleProviderWebhookCommand, HandleProviderWebhookHandler, HandleProviderWebhookResult,
    WebhookOutcome,
};
pub use issue_checkout_session::{
    CheckoutSettings, IssueCheckoutSessionCommand, IssueCheckoutSessionHandler,
    IssueCheckoutSessionResult,
};
pub use reconcile_entitlements::{
    select_latest, ReconcileEntitlementsHandler, SweepReport, UserReconciliation,
};
pub use reconciliation_scheduler::{ReconciliationScheduler, DEFAULT_SWEEP_INTERVAL};

// Queries
pub use entitlement_gate::{DenyReason, EntitlementDecision, EntitlementGate};
pub use get_subscription_status::{
    GetSubscriptionStatusHandler, GetSubscriptionStatusQuery, GetSubscriptionStatusResult,
};
