//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - HS256 session token validation
//! - `http` - axum REST API
//! - `memory` - in-process entitlement store for tests and local runs
//! - `postgres` - PostgreSQL entitlement store
//! - `stripe` - Stripe REST client and a scripted mock

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;

pub use auth::{JwtConfig, JwtSessionValidator, MockSessionValidator};
pub use memory::InMemoryEntitlementStore;
pub use postgres::{
    PostgresEntitlementReader, PostgresEntitlementRepository, PostgresProcessedEventLog,
};
pub use stripe::{MockBillingProvider, StripeBillingProvider, StripeConfig};
