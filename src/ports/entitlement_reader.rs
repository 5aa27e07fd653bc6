//! Entitlement reader port (read side).
//!
//! The gate's only view of the store. Implementations must read current
//! state on every call: no caching, because a stale answer either grants
//! service that was revoked or denies service that was paid for.

use async_trait::async_trait;

use crate::domain::entitlement::SubscriptionStatus;
use crate::domain::foundation::{DomainError, UserId};

/// Reader port for entitlement checks.
#[async_trait]
pub trait EntitlementReader: Send + Sync {
    /// The user's stored status, or `None` if the user does not exist.
    async fn subscription_status(
        &self,
        user_id: UserId,
    ) -> Result<Option<SubscriptionStatus>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entitlement_reader_is_object_safe() {
        fn _accepts_dyn(_reader: &dyn EntitlementReader) {}
    }
}
