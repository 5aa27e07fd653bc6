//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers write through `EntitlementRepository`; the gate and the
//! status query only read.

pub mod handlers;

pub use handlers::entitlement::{
    CheckoutSettings, CreatePostHandler, CreateReplyHandler, EntitlementGate,
    GetSubscriptionStatusHandler, HandleProviderWebhookHandler, IssueCheckoutSessionHandler,
    ReconcileEntitlementsHandler, ReconciliationScheduler, SweepReport,
};
