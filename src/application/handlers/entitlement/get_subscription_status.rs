//! GetSubscriptionStatusHandler - Query handler for a user's entitlement view.

use std::sync::Arc;

use crate::domain::entitlement::{EntitlementError, SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::UserId;
use crate::ports::EntitlementRepository;

/// Query for a user's subscription status.
#[derive(Debug, Clone)]
pub struct GetSubscriptionStatusQuery {
    pub user_id: UserId,
}

/// Stored entitlement state for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSubscriptionStatusResult {
    pub user_id: UserId,
    pub status: SubscriptionStatus,
    pub entitled: bool,
    pub has_billing_customer: bool,
    /// Most recently created subscription record, for display only.
    pub current_subscription: Option<SubscriptionRecord>,
}

/// Handler for subscription status queries.
pub struct GetSubscriptionStatusHandler {
    repository: Arc<dyn EntitlementRepository>,
}

impl GetSubscriptionStatusHandler {
    pub fn new(repository: Arc<dyn EntitlementRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionStatusQuery,
    ) -> Result<GetSubscriptionStatusResult, EntitlementError> {
        let account = self
            .repository
            .find_user(query.user_id)
            .await?
            .ok_or_else(|| EntitlementError::user_not_found(query.user_id))?;

        let current_subscription = self.repository.current_subscription(query.user_id).await?;

        Ok(GetSubscriptionStatusResult {
            user_id: account.user_id,
            status: account.subscription_status,
            entitled: account.subscription_status.is_entitled(),
            has_billing_customer: account.customer_ref().is_some(),
            current_subscription,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryEntitlementStore;
    use crate::domain::entitlement::{BillingAccount, EntitlementChange, SubscriptionSnapshot};
    use crate::domain::foundation::Timestamp;
    use crate::ports::EntitlementRepository as _;

    fn user(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn returns_status_and_current_subscription() {
        let store = InMemoryEntitlementStore::new();
        store
            .insert_user(BillingAccount::new(user(1), "a@example.com", "a").with_customer_ref("cus_1"))
            .await;
        let now = Timestamp::now();
        store
            .apply_change(&EntitlementChange::from_snapshot(SubscriptionSnapshot {
                user_id: user(1),
                provider_subscription_ref: "sub_1".to_string(),
                status: SubscriptionStatus::Active,
                current_period_start: now,
                current_period_end: now.add_days(30),
            }))
            .await
            .unwrap();

        let result = GetSubscriptionStatusHandler::new(Arc::new(store))
            .handle(GetSubscriptionStatusQuery { user_id: user(1) })
            .await
            .unwrap();

        assert_eq!(result.status, SubscriptionStatus::Active);
        assert!(result.entitled);
        assert!(result.has_billing_customer);
        assert_eq!(
            result.current_subscription.unwrap().provider_subscription_ref,
            "sub_1"
        );
    }

    #[tokio::test]
    async fn new_user_has_no_subscription() {
        let store = InMemoryEntitlementStore::new();
        store
            .insert_user(BillingAccount::new(user(2), "b@example.com", "b"))
            .await;

        let result = GetSubscriptionStatusHandler::new(Arc::new(store))
            .handle(GetSubscriptionStatusQuery { user_id: user(2) })
            .await
            .unwrap();

        assert_eq!(result.status, SubscriptionStatus::Inactive);
        assert!(!result.entitled);
        assert!(!result.has_billing_customer);
        assert!(result.current_subscription.is_none());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let err = GetSubscriptionStatusHandler::new(Arc::new(InMemoryEntitlementStore::new()))
            .handle(GetSubscriptionStatusQuery { user_id: user(3) })
            .await
            .unwrap_err();

        assert_eq!(err, EntitlementError::user_not_found(user(3)));
    }
}
