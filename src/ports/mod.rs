//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `BillingProvider` - customer creation, checkout, subscription listing
//! - `EntitlementRepository` - user status, customer refs, subscription records
//! - `EntitlementReader` - uncached status reads for the gate
//! - `ProcessedEventLog` - webhook delivery de-duplication
//! - `SessionValidator` - bearer token validation
//! - `ContentWriter` - post/reply persistence behind the gate

mod billing_provider;
mod content_writer;
mod entitlement_reader;
mod entitlement_repository;
mod processed_event_log;
mod session_validator;

pub use billing_provider::{
    BillingProvider, CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest,
    ProviderCustomer, ProviderError, ProviderErrorCode, ProviderSubscription,
};
pub use content_writer::{ContentRef, ContentWriter, NewPost, NewReply};
pub use entitlement_reader::EntitlementReader;
pub use entitlement_repository::EntitlementRepository;
pub use processed_event_log::ProcessedEventLog;
pub use session_validator::SessionValidator;
