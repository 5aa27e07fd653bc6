//! HTTP adapters - REST API implementations.

pub mod entitlement;
pub mod middleware;

// Re-export key types for convenience
pub use entitlement::{
    entitlement_router, ContentAppState, RouterSettings, SubscriptionAppState,
};
pub use middleware::{auth_middleware, AuthState, RequireAuth};
