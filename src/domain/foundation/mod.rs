//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, authentication identity, and the error types
//! shared by every layer of the entitlement engine.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{SubscriptionId, UserId};
pub use timestamp::Timestamp;
