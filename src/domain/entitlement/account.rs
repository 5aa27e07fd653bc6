//! Billing view of a user account.

use serde::{Deserialize, Serialize};

use super::SubscriptionStatus;
use crate::domain::foundation::UserId;

/// The entitlement-relevant fields of a user record.
///
/// The rest of the user (credentials, profile, content) lives in other
/// systems; only what checkout, webhooks, and the sweep need is loaded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAccount {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    /// False once an administrator deactivates the account.
    pub is_active: bool,
    pub subscription_status: SubscriptionStatus,
    /// Provider customer id. Write-once: set on first checkout and never replaced.
    pub billing_customer_ref: Option<String>,
}

impl BillingAccount {
    /// A freshly registered account: inactive, no customer ref.
    pub fn new(user_id: UserId, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            display_name: display_name.into(),
            is_active: true,
            subscription_status: SubscriptionStatus::Inactive,
            billing_customer_ref: None,
        }
    }

    pub fn with_customer_ref(mut self, customer_ref: impl Into<String>) -> Self {
        self.billing_customer_ref = Some(customer_ref.into());
        self
    }

    pub fn with_status(mut self, status: SubscriptionStatus) -> Self {
        self.subscription_status = status;
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Customer ref if one is set and non-empty.
    pub fn customer_ref(&self) -> Option<&str> {
        self.billing_customer_ref
            .as_deref()
            .filter(|r| !r.trim().is_empty())
    }
}
