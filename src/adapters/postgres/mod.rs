//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! - `PostgresEntitlementRepository` - users, customer refs, subscriptions
//! - `PostgresEntitlementReader` - uncached status reads for the gate
//! - `PostgresProcessedEventLog` - webhook delivery de-duplication

mod entitlement_reader;
mod entitlement_repository;
mod processed_event_log;

pub use entitlement_reader::PostgresEntitlementReader;
pub use entitlement_repository::PostgresEntitlementRepository;
pub use processed_event_log::PostgresProcessedEventLog;

/// Embedded schema migrations from `migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
