//! Provider status to internal status mapping.
//!
//! This is the single place provider vocabulary is translated. The webhook
//! processor and the reconciliation sweep both call [`map_provider_status`],
//! so the two channels always agree on what a provider status means.

use super::SubscriptionStatus;

/// What kind of provider signal produced the status being mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSignal {
    /// A subscription object was observed (webhook or listing).
    SubscriptionEvent,
    /// An invoice payment failed for the customer.
    PaymentFailure,
}

/// Maps a provider-reported subscription status to an internal status.
///
/// Total and side-effect free. Unknown statuses map to `Inactive` so they
/// never grant entitlement. A payment failure downgrades to `PastDue`
/// unless the provider already reports the subscription as ended.
pub fn map_provider_status(provider_status: &str, signal: ProviderSignal) -> SubscriptionStatus {
    let mapped = match provider_status {
        "active" => SubscriptionStatus::Active,
        "past_due" => SubscriptionStatus::PastDue,
        "canceled" | "incomplete_expired" | "unpaid" => SubscriptionStatus::Canceled,
        _ => SubscriptionStatus::Inactive,
    };

    match (signal, mapped) {
        (ProviderSignal::PaymentFailure, SubscriptionStatus::Canceled) => {
            SubscriptionStatus::Canceled
        }
        (ProviderSignal::PaymentFailure, _) => SubscriptionStatus::PastDue,
        (ProviderSignal::SubscriptionEvent, status) => status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn active_maps_to_active() {
        assert_eq!(
            map_provider_status("active", ProviderSignal::SubscriptionEvent),
            SubscriptionStatus::Active
        );
    }

    #[test]
    fn past_due_maps_to_past_due() {
        assert_eq!(
            map_provider_status("past_due", ProviderSignal::SubscriptionEvent),
            SubscriptionStatus::PastDue
        );
    }

    #[test]
    fn terminal_statuses_map_to_canceled() {
        for status in ["canceled", "incomplete_expired", "unpaid"] {
            assert_eq!(
                map_provider_status(status, ProviderSignal::SubscriptionEvent),
                SubscriptionStatus::Canceled,
                "{status}"
            );
        }
    }

    #[test]
    fn unknown_statuses_fail_safe_to_inactive() {
        for status in ["trialing", "incomplete", "paused", "", "ACTIVE", "active "] {
            assert_eq!(
                map_provider_status(status, ProviderSignal::SubscriptionEvent),
                SubscriptionStatus::Inactive,
                "{status:?}"
            );
        }
    }

    #[test]
    fn payment_failure_downgrades_live_subscriptions() {
        assert_eq!(
            map_provider_status("active", ProviderSignal::PaymentFailure),
            SubscriptionStatus::PastDue
        );
        assert_eq!(
            map_provider_status("", ProviderSignal::PaymentFailure),
            SubscriptionStatus::PastDue
        );
    }

    #[test]
    fn payment_failure_with_cancellation_stays_canceled() {
        assert_eq!(
            map_provider_status("canceled", ProviderSignal::PaymentFailure),
            SubscriptionStatus::Canceled
        );
    }

    proptest! {
        #[test]
        fn mapping_is_deterministic(status in ".*") {
            let first = map_provider_status(&status, ProviderSignal::SubscriptionEvent);
            let second = map_provider_status(&status, ProviderSignal::SubscriptionEvent);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn only_literal_active_grants_entitlement(status in "[a-z_]{0,20}") {
            let mapped = map_provider_status(&status, ProviderSignal::SubscriptionEvent);
            prop_assert_eq!(mapped.is_entitled(), status == "active");
        }

        #[test]
        fn payment_failure_never_entitles(status in ".*") {
            let mapped = map_provider_status(&status, ProviderSignal::PaymentFailure);
            prop_assert!(!mapped.is_entitled());
        }
    }
}
