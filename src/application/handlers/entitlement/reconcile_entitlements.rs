//! ReconcileEntitlementsHandler - Batch command forcing local entitlement
//! state into agreement with the billing provider.
//!
//! Users are processed one at a time to bound provider API usage. A failure
//! for one user is logged and counted, never fatal to the sweep. The sweep
//! can be cancelled between users; each user's write is a single atomic
//! store change, so cancellation never leaves a half-written user.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::domain::entitlement::{
    map_provider_status, BillingAccount, EntitlementChange, EntitlementError, ProviderSignal,
    SubscriptionSnapshot, SubscriptionStatus,
};
use crate::ports::{BillingProvider, EntitlementRepository, ProviderSubscription};

/// Counters describing one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Users whose provider state was checked.
    pub examined: usize,
    /// Users whose stored status changed.
    pub updated: usize,
    /// Users rewritten with the status they already had.
    pub unchanged: usize,
    /// Users with no provider subscriptions forced back to inactive.
    pub downgraded_to_inactive: usize,
    /// Users whose provider call or store write failed.
    pub failed: usize,
    /// True when the sweep stopped early on a cancel signal.
    pub cancelled: bool,
}

/// Result of reconciling a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserReconciliation {
    Updated {
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    },
    Unchanged(SubscriptionStatus),
}

/// Picks the authoritative subscription: latest `created`, ties going to
/// the later entry in the provider's list.
pub fn select_latest(subscriptions: &[ProviderSubscription]) -> Option<&ProviderSubscription> {
    subscriptions.iter().fold(None, |best, candidate| match best {
        Some(current) if current.created > candidate.created => Some(current),
        _ => Some(candidate),
    })
}

/// Handler for the reconciliation sweep.
pub struct ReconcileEntitlementsHandler {
    repository: Arc<dyn EntitlementRepository>,
    provider: Arc<dyn BillingProvider>,
}

impl ReconcileEntitlementsHandler {
    pub fn new(
        repository: Arc<dyn EntitlementRepository>,
        provider: Arc<dyn BillingProvider>,
    ) -> Self {
        Self {
            repository,
            provider,
        }
    }

    /// Runs one sweep over every user with a customer ref.
    ///
    /// Fails only if the user list cannot be loaded.
    pub async fn run(
        &self,
        cancel: &watch::Receiver<bool>,
    ) -> Result<SweepReport, EntitlementError> {
        let accounts = self.repository.users_with_customer_ref().await.map_err(|e| {
            tracing::error!(error = %e, "reconciliation sweep could not load users");
            EntitlementError::from(e)
        })?;

        tracing::info!(users = accounts.len(), "reconciliation sweep started");
        let mut report = SweepReport::default();

        for account in &accounts {
            if *cancel.borrow() {
                report.cancelled = true;
                tracing::info!(examined = report.examined, "reconciliation sweep cancelled");
                break;
            }

            report.examined += 1;
            match self.reconcile_user(account).await {
                Ok(UserReconciliation::Updated { from, to }) => {
                    report.updated += 1;
                    if to == SubscriptionStatus::Inactive {
                        report.downgraded_to_inactive += 1;
                    }
                    tracing::info!(user_id = %account.user_id, from = %from, to = %to, "entitlement corrected");
                }
                Ok(UserReconciliation::Unchanged(_)) => report.unchanged += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        user_id = %account.user_id,
                        customer_ref = ?account.billing_customer_ref,
                        error = %e,
                        "reconciliation failed for user"
                    );
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            updated = report.updated,
            unchanged = report.unchanged,
            downgraded_to_inactive = report.downgraded_to_inactive,
            failed = report.failed,
            cancelled = report.cancelled,
            "reconciliation sweep finished"
        );

        Ok(report)
    }

    /// Overwrites one user's status with what the provider reports now.
    pub async fn reconcile_user(
        &self,
        account: &BillingAccount,
    ) -> Result<UserReconciliation, EntitlementError> {
        let customer_ref = account.customer_ref().ok_or_else(|| {
            EntitlementError::validation("billing_customer_ref", "user has no customer ref")
        })?;

        let subscriptions = self.provider.list_subscriptions(customer_ref).await?;

        let change = match select_latest(&subscriptions) {
            None => EntitlementChange::status_only(account.user_id, SubscriptionStatus::Inactive),
            Some(latest) => EntitlementChange::from_snapshot(SubscriptionSnapshot {
                user_id: account.user_id,
                provider_subscription_ref: latest.id.clone(),
                status: map_provider_status(&latest.status, ProviderSignal::SubscriptionEvent),
                current_period_start: latest.current_period_start,
                current_period_end: latest.current_period_end,
            }),
        };

        // Always written: the provider's current answer beats whatever a
        // webhook wrote earlier, even when the status looks the same.
        self.repository.apply_change(&change).await?;

        let previous = account.subscription_status;
        if previous == change.status {
            Ok(UserReconciliation::Unchanged(previous))
        } else {
            Ok(UserReconciliation::Updated {
                from: previous,
                to: change.status,
            })
        }
    }
}
