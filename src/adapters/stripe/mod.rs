//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` port for Stripe integration:
//! - Customer creation (idempotent per user)
//! - Hosted checkout sessions
//! - Subscription listing for reconciliation
//!
//! Webhook signature verification lives in the domain
//! (`domain::entitlement::WebhookVerifier`) so it can be tested without HTTP.

mod api_types;
mod mock_billing_provider;
mod stripe_adapter;

pub use api_types::{StripeCheckoutSession, StripeCustomer, StripeSubscription, StripeSubscriptionList};
pub use mock_billing_provider::{MethodCall, MockBillingProvider};
pub use stripe_adapter::{StripeBillingProvider, StripeConfig, DEFAULT_API_BASE_URL};
