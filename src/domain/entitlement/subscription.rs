//! Subscription records and the atomic store write built from them.

use serde::{Deserialize, Serialize};

use super::SubscriptionStatus;
use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};

/// A stored subscription instance.
///
/// Informational history: the gate never reads this, only the user's status.
/// Records are upserted by `provider_subscription_ref` and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub provider_subscription_ref: String,
    pub status: SubscriptionStatus,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Observed provider state for one subscription, ready to upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub user_id: UserId,
    pub provider_subscription_ref: String,
    pub status: SubscriptionStatus,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
}

/// One atomic write to the entitlement store.
///
/// The user's status and, when present, the subscription upsert commit
/// together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementChange {
    pub user_id: UserId,
    pub status: SubscriptionStatus,
    pub subscription: Option<SubscriptionSnapshot>,
}

impl EntitlementChange {
    /// Status-only change, e.g. a payment failure or an empty provider listing.
    pub fn status_only(user_id: UserId, status: SubscriptionStatus) -> Self {
        Self {
            user_id,
            status,
            subscription: None,
        }
    }

    /// Status change carried by an observed subscription. The user status
    /// and the stored subscription status are the same value.
    pub fn from_snapshot(snapshot: SubscriptionSnapshot) -> Self {
        Self {
            user_id: snapshot.user_id,
            status: snapshot.status,
            subscription: Some(snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_snapshot_copies_user_and_status() {
        let user_id = UserId::new(5).unwrap();
        let snapshot = SubscriptionSnapshot {
            user_id,
            provider_subscription_ref: "sub_1".to_string(),
            status: SubscriptionStatus::PastDue,
            current_period_start: Timestamp::from_unix_secs(1_700_000_000),
            current_period_end: Timestamp::from_unix_secs(1_702_592_000),
        };

        let change = EntitlementChange::from_snapshot(snapshot.clone());

        assert_eq!(change.user_id, user_id);
        assert_eq!(change.status, SubscriptionStatus::PastDue);
        assert_eq!(change.subscription, Some(snapshot));
    }

    #[test]
    fn status_only_carries_no_subscription() {
        let change =
            EntitlementChange::status_only(UserId::new(5).unwrap(), SubscriptionStatus::Inactive);
        assert!(change.subscription.is_none());
    }
}
