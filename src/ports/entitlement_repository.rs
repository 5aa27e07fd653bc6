//! Entitlement repository port (write side).
//!
//! The persisted entitlement state: each user's status and customer ref,
//! and every subscription instance seen from the provider. Writes are
//! upserts keyed on unique columns, so concurrent writers converge to
//! whichever commits last without locking.
//!
//! # Contract
//!
//! - `find_user_by_customer_ref` must be an indexed lookup; at most one user
//!   owns a given ref.
//! - `attach_customer_ref` never overwrites a populated ref.
//! - `apply_change` is atomic: user status and subscription upsert commit
//!   together.
//! - Subscription records are never deleted.

use async_trait::async_trait;

use crate::domain::entitlement::{BillingAccount, EntitlementChange, SubscriptionRecord};
use crate::domain::foundation::{DomainError, UserId};

/// Repository port for entitlement state.
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    /// Load the billing view of a user.
    ///
    /// Returns `None` if the user does not exist.
    async fn find_user(&self, user_id: UserId) -> Result<Option<BillingAccount>, DomainError>;

    /// Resolve the user that owns a provider customer ref.
    async fn find_user_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<BillingAccount>, DomainError>;

    /// Set the user's customer ref if it is currently unset.
    ///
    /// Returns `true` if this call wrote the ref, `false` if one was
    /// already present (the existing ref is kept).
    async fn attach_customer_ref(
        &self,
        user_id: UserId,
        customer_ref: &str,
    ) -> Result<bool, DomainError>;

    /// Every user with a non-empty customer ref, ordered by id.
    async fn users_with_customer_ref(&self) -> Result<Vec<BillingAccount>, DomainError>;

    /// Atomically upsert the subscription (if any) and write the user status.
    ///
    /// Returns the stored subscription record when one was part of the change.
    async fn apply_change(
        &self,
        change: &EntitlementChange,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Look up a subscription by its provider ref.
    async fn find_subscription(
        &self,
        provider_subscription_ref: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// The most recently created subscription record for a user.
    async fn current_subscription(
        &self,
        user_id: UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;
}
