//! EntitlementGate - Guard consulted before subscription-gated actions.

use std::sync::Arc;

use crate::domain::entitlement::{EntitlementError, SubscriptionStatus};
use crate::domain::foundation::UserId;
use crate::ports::EntitlementReader;

/// Outcome of an entitlement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementDecision {
    Allow,
    Deny(DenyReason),
}

/// Why the gate denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    UnknownUser,
    NotActive(SubscriptionStatus),
}

impl EntitlementDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, EntitlementDecision::Allow)
    }
}

/// Reads the stored status on every call. Never caches.
#[derive(Clone)]
pub struct EntitlementGate {
    reader: Arc<dyn EntitlementReader>,
}

impl EntitlementGate {
    pub fn new(reader: Arc<dyn EntitlementReader>) -> Self {
        Self { reader }
    }

    /// Allows only users whose stored status is exactly `active`.
    pub async fn check(&self, user_id: UserId) -> Result<EntitlementDecision, EntitlementError> {
        let decision = match self.reader.subscription_status(user_id).await? {
            None => EntitlementDecision::Deny(DenyReason::UnknownUser),
            Some(status) if status.is_entitled() => EntitlementDecision::Allow,
            Some(status) => EntitlementDecision::Deny(DenyReason::NotActive(status)),
        };
        Ok(decision)
    }

    /// Like `check`, but a deny becomes `SubscriptionRequired` for `action`.
    pub async fn require(&self, user_id: UserId, action: &str) -> Result<(), EntitlementError> {
        match self.check(user_id).await? {
            EntitlementDecision::Allow => Ok(()),
            EntitlementDecision::Deny(reason) => {
                tracing::debug!(%user_id, ?reason, action, "entitlement denied");
                Err(EntitlementError::subscription_required(action))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryEntitlementStore;
    use crate::domain::entitlement::BillingAccount;
    use crate::domain::foundation::DomainError;
    use async_trait::async_trait;

    fn user(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn gate_with(status: SubscriptionStatus) -> EntitlementGate {
        let store = InMemoryEntitlementStore::new();
        store
            .insert_user(BillingAccount::new(user(1), "a@example.com", "a").with_status(status))
            .await;
        EntitlementGate::new(Arc::new(store))
    }

    struct UnreachableReader;

    #[async_trait]
    impl EntitlementReader for UnreachableReader {
        async fn subscription_status(
            &self,
            _user_id: UserId,
        ) -> Result<Option<SubscriptionStatus>, DomainError> {
            Err(DomainError::database("pool timed out"))
        }
    }

    #[tokio::test]
    async fn only_active_is_allowed() {
        assert_eq!(
            gate_with(SubscriptionStatus::Active).await.check(user(1)).await.unwrap(),
            EntitlementDecision::Allow
        );

        for status in [
            SubscriptionStatus::Inactive,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Canceled,
        ] {
            assert_eq!(
                gate_with(status).await.check(user(1)).await.unwrap(),
                EntitlementDecision::Deny(DenyReason::NotActive(status))
            );
        }
    }

    #[tokio::test]
    async fn unknown_user_is_denied() {
        let gate = gate_with(SubscriptionStatus::Active).await;
        assert_eq!(
            gate.check(user(2)).await.unwrap(),
            EntitlementDecision::Deny(DenyReason::UnknownUser)
        );
    }

    #[tokio::test]
    async fn gate_sees_status_changes_immediately() {
        let store = InMemoryEntitlementStore::new();
        store
            .insert_user(BillingAccount::new(user(1), "a@example.com", "a"))
            .await;
        let gate = EntitlementGate::new(Arc::new(store.clone()));
        assert!(!gate.check(user(1)).await.unwrap().is_allowed());

        store
            .insert_user(
                BillingAccount::new(user(1), "a@example.com", "a").with_status(SubscriptionStatus::Active),
            )
            .await;
        assert!(gate.check(user(1)).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn require_maps_deny_to_subscription_required() {
        let gate = gate_with(SubscriptionStatus::PastDue).await;

        let err = gate.require(user(1), "create posts").await.unwrap_err();

        assert_eq!(err, EntitlementError::subscription_required("create posts"));
        assert_eq!(err.to_string(), "active subscription required to create posts");
    }

    #[tokio::test]
    async fn store_failure_is_not_a_deny() {
        let gate = EntitlementGate::new(Arc::new(UnreachableReader));

        let err = gate.check(user(1)).await.unwrap_err();

        assert!(matches!(err, EntitlementError::Infrastructure(_)));
    }
}
