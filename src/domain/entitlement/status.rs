//! Internal entitlement status.
//!
//! The four values stored on a user record and mirrored on each
//! subscription record. Writes are last-write-wins, so there is no
//! transition table here: any status may follow any other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Entitlement state of a user or a stored subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// No paid subscription. Starting state for every user.
    #[default]
    Inactive,

    /// Paid and current. The only entitled state.
    Active,

    /// A payment failed. Not entitled until the provider reports active again.
    PastDue,

    /// Subscription ended or was deleted. Kept for history.
    Canceled,
}

impl SubscriptionStatus {
    /// Returns true if this status grants access to subscription-gated features.
    ///
    /// Only `Active` is entitled; `PastDue` gets no grace period.
    pub fn is_entitled(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }

    /// Storage representation, identical to the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    /// Parses a stored status. Unlike the provider mapping this is strict:
    /// a value outside the four known states means the row is corrupt.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(SubscriptionStatus::Inactive),
            "active" => Ok(SubscriptionStatus::Active),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            other => Err(ValidationError::invalid_format(
                "subscription_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}
