//! In-memory adapters.

mod in_memory_entitlement_store;

pub use in_memory_entitlement_store::InMemoryEntitlementStore;
