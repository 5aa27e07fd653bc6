//! Domain layer containing business logic and domain types.
//!
//! - `foundation` - Shared primitives (IDs, timestamps, errors, auth identity)
//! - `entitlement` - Subscription status, provider mapping, webhook events

pub mod entitlement;
pub mod foundation;
