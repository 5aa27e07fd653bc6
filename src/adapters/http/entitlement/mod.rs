//! HTTP adapter for subscription and gated content endpoints.
//!
//! - `GET /api/subscription` - Current user's entitlement view
//! - `POST /api/subscription/create-checkout-session` - Start a hosted checkout
//! - `POST /api/subscription/webhook` - Billing provider webhooks (signature verified)
//! - `POST /api/posts` - Create a post (gated)
//! - `POST /api/posts/:post_id/replies` - Reply to a post (gated)
//! - `GET /health` - Liveness probe

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{
    ContentAppState, EntitlementApiError, SubscriptionAppState, WebhookApiError, SIGNATURE_HEADER,
};
pub use routes::{entitlement_router, RouterSettings};
