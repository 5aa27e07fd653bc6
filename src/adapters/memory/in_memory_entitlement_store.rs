//! In-memory entitlement store.
//!
//! Implements the repository, reader, and processed-event ports over one
//! lock, so `apply_change` is atomic just like the database transaction.
//! Useful for tests and local development.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entitlement::{
    BillingAccount, EntitlementChange, SubscriptionRecord, SubscriptionStatus,
};
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, UserId};
use crate::ports::{EntitlementReader, EntitlementRepository, ProcessedEventLog};

#[derive(Debug, Default)]
struct StoreState {
    users: BTreeMap<UserId, BillingAccount>,
    subscriptions: HashMap<String, SubscriptionRecord>,
    processed_events: HashSet<String>,
    next_subscription_id: i64,
}

/// In-memory storage for entitlement state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntitlementStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a user account.
    pub async fn insert_user(&self, account: BillingAccount) {
        self.state
            .write()
            .await
            .users
            .insert(account.user_id, account);
    }

    /// Snapshot of a stored user.
    pub async fn user(&self, user_id: UserId) -> Option<BillingAccount> {
        self.state.read().await.users.get(&user_id).cloned()
    }

    /// All stored subscription records, ordered by local id.
    pub async fn subscriptions(&self) -> Vec<SubscriptionRecord> {
        let mut records: Vec<_> = self
            .state
            .read()
            .await
            .subscriptions
            .values()
            .cloned()
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// Number of event ids recorded as processed.
    pub async fn processed_event_count(&self) -> usize {
        self.state.read().await.processed_events.len()
    }
}

#[async_trait]
impl EntitlementRepository for InMemoryEntitlementStore {
    async fn find_user(&self, user_id: UserId) -> Result<Option<BillingAccount>, DomainError> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<BillingAccount>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.customer_ref() == Some(customer_ref))
            .cloned())
    }

    async fn attach_customer_ref(
        &self,
        user_id: UserId,
        customer_ref: &str,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;

        // Mirrors the unique index on the customer ref column.
        let owned_elsewhere = state
            .users
            .values()
            .any(|u| u.user_id != user_id && u.customer_ref() == Some(customer_ref));
        if owned_elsewhere {
            return Err(DomainError::database(format!(
                "customer ref {} already belongs to another user",
                customer_ref
            )));
        }

        let account = state.users.get_mut(&user_id).ok_or_else(|| {
            DomainError::new(ErrorCode::UserNotFound, format!("User {} not found", user_id))
        })?;

        if account.customer_ref().is_some() {
            return Ok(false);
        }
        account.billing_customer_ref = Some(customer_ref.to_string());
        Ok(true)
    }

    async fn users_with_customer_ref(&self) -> Result<Vec<BillingAccount>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.customer_ref().is_some())
            .cloned()
            .collect())
    }

    async fn apply_change(
        &self,
        change: &EntitlementChange,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if !state.users.contains_key(&change.user_id) {
            return Err(DomainError::new(
                ErrorCode::UserNotFound,
                format!("User {} not found", change.user_id),
            ));
        }

        let now = Timestamp::now();
        let stored = match &change.subscription {
            Some(snapshot) => {
                let next_id = state.next_subscription_id + 1;
                let record = match state
                    .subscriptions
                    .get_mut(&snapshot.provider_subscription_ref)
                {
                    Some(existing) => {
                        existing.user_id = snapshot.user_id;
                        existing.status = snapshot.status;
                        existing.current_period_start = snapshot.current_period_start;
                        existing.current_period_end = snapshot.current_period_end;
                        existing.updated_at = now;
                        existing.clone()
                    }
                    None => {
                        let record = SubscriptionRecord {
                            id: SubscriptionId::from_i64(next_id),
                            user_id: snapshot.user_id,
                            provider_subscription_ref: snapshot.provider_subscription_ref.clone(),
                            status: snapshot.status,
                            current_period_start: snapshot.current_period_start,
                            current_period_end: snapshot.current_period_end,
                            created_at: now,
                            updated_at: now,
                        };
                        state.next_subscription_id = next_id;
                        state
                            .subscriptions
                            .insert(record.provider_subscription_ref.clone(), record.clone());
                        record
                    }
                };
                Some(record)
            }
            None => None,
        };

        if let Some(account) = state.users.get_mut(&change.user_id) {
            account.subscription_status = change.status;
        }

        Ok(stored)
    }

    async fn find_subscription(
        &self,
        provider_subscription_ref: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .subscriptions
            .get(provider_subscription_ref)
            .cloned())
    }

    async fn current_subscription(
        &self,
        user_id: UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .values()
            .filter(|r| r.user_id == user_id)
            .max_by_key(|r| (r.created_at, r.id))
            .cloned())
    }
}

#[async_trait]
impl EntitlementReader for InMemoryEntitlementStore {
    async fn subscription_status(
        &self,
        user_id: UserId,
    ) -> Result<Option<SubscriptionStatus>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .get(&user_id)
            .map(|u| u.subscription_status))
    }
}

#[async_trait]
impl ProcessedEventLog for InMemoryEntitlementStore {
    async fn is_processed(&self, event_id: &str) -> Result<bool, DomainError> {
        Ok(self.state.read().await.processed_events.contains(event_id))
    }

    async fn mark_processed(&self, event_id: &str, _event_type: &str) -> Result<(), DomainError> {
        self.state
            .write()
            .await
            .processed_events
            .insert(event_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::SubscriptionSnapshot;

    fn user_id(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn snapshot(user: i64, sub_ref: &str, status: SubscriptionStatus) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            user_id: user_id(user),
            provider_subscription_ref: sub_ref.to_string(),
            status,
            current_period_start: Timestamp::from_unix_secs(1_000),
            current_period_end: Timestamp::from_unix_secs(2_000),
        }
    }

    async fn store_with_user(id: i64) -> InMemoryEntitlementStore {
        let store = InMemoryEntitlementStore::new();
        store
            .insert_user(BillingAccount::new(user_id(id), "u@example.com", "user"))
            .await;
        store
    }

    #[tokio::test]
    async fn attach_customer_ref_is_write_once() {
        let store = store_with_user(1).await;

        assert!(store.attach_customer_ref(user_id(1), "cus_a").await.unwrap());
        assert!(!store.attach_customer_ref(user_id(1), "cus_b").await.unwrap());

        let user = store.user(user_id(1)).await.unwrap();
        assert_eq!(user.customer_ref(), Some("cus_a"));
    }

    #[tokio::test]
    async fn attach_customer_ref_rejects_ref_owned_by_another_user() {
        let store = store_with_user(1).await;
        store
            .insert_user(BillingAccount::new(user_id(2), "b@example.com", "bob"))
            .await;
        store.attach_customer_ref(user_id(1), "cus_a").await.unwrap();

        let result = store.attach_customer_ref(user_id(2), "cus_a").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn apply_change_upserts_by_provider_ref() {
        let store = store_with_user(1).await;

        let first = store
            .apply_change(&EntitlementChange::from_snapshot(snapshot(
                1,
                "sub_1",
                SubscriptionStatus::Active,
            )))
            .await
            .unwrap()
            .unwrap();
        let second = store
            .apply_change(&EntitlementChange::from_snapshot(snapshot(
                1,
                "sub_1",
                SubscriptionStatus::PastDue,
            )))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.subscriptions().await.len(), 1);
        assert_eq!(second.status, SubscriptionStatus::PastDue);
        assert_eq!(
            store.subscription_status(user_id(1)).await.unwrap(),
            Some(SubscriptionStatus::PastDue)
        );
    }

    #[tokio::test]
    async fn apply_change_for_missing_user_fails_without_writing() {
        let store = InMemoryEntitlementStore::new();

        let result = store
            .apply_change(&EntitlementChange::from_snapshot(snapshot(
                9,
                "sub_9",
                SubscriptionStatus::Active,
            )))
            .await;

        assert!(result.is_err());
        assert!(store.subscriptions().await.is_empty());
    }

    #[tokio::test]
    async fn users_with_customer_ref_skips_users_without_one() {
        let store = store_with_user(1).await;
        store
            .insert_user(
                BillingAccount::new(user_id(2), "b@example.com", "bob").with_customer_ref("cus_b"),
            )
            .await;

        let users = store.users_with_customer_ref().await.unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, user_id(2));
    }

    #[tokio::test]
    async fn processed_events_are_remembered() {
        let store = InMemoryEntitlementStore::new();

        assert!(!store.is_processed("evt_1").await.unwrap());
        store.mark_processed("evt_1", "customer.subscription.created").await.unwrap();
        store.mark_processed("evt_1", "customer.subscription.created").await.unwrap();

        assert!(store.is_processed("evt_1").await.unwrap());
        assert_eq!(store.processed_event_count().await, 1);
    }
}
