//! HandleProviderWebhookHandler - Command handler for billing provider webhooks.
//!
//! Verify, decode, de-duplicate, then fold the event into the entitlement
//! store. Every write is an upsert keyed by provider ref or user id, so a
//! redelivered or reordered event converges instead of duplicating.

use std::sync::Arc;

use crate::domain::entitlement::{
    map_provider_status, BillingAccount, CheckoutCompleted, EntitlementChange, PaymentFailed,
    ProviderEvent, ProviderEventKind, ProviderSignal, SubscriptionChanged, SubscriptionSnapshot,
    SubscriptionStatus, WebhookError, WebhookVerifier,
};
use crate::domain::foundation::UserId;
use crate::ports::{EntitlementRepository, ProcessedEventLog};

/// Command to handle one webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleProviderWebhookCommand {
    /// Raw request body, exactly as signed.
    pub payload: Vec<u8>,
    /// Value of the signature header, if present.
    pub signature: Option<String>,
}

/// What processing did with the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The user's status was written.
    Applied {
        user_id: UserId,
        status: SubscriptionStatus,
    },
    /// Checkout completion attached a missing customer ref.
    CustomerRefBackfilled { user_id: UserId },
    /// Known event type with nothing to change.
    Acknowledged,
    /// Event type this system does not act on.
    Ignored,
    /// Event id was already processed.
    Duplicate,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleProviderWebhookResult {
    pub event_id: String,
    pub event_type: String,
    pub outcome: WebhookOutcome,
}

/// Handler for billing provider webhooks.
pub struct HandleProviderWebhookHandler {
    repository: Arc<dyn EntitlementRepository>,
    event_log: Arc<dyn ProcessedEventLog>,
    verifier: WebhookVerifier,
    /// Mode of the configured API key; `None` accepts both.
    expected_livemode: Option<bool>,
}

impl HandleProviderWebhookHandler {
    pub fn new(
        repository: Arc<dyn EntitlementRepository>,
        event_log: Arc<dyn ProcessedEventLog>,
        verifier: WebhookVerifier,
    ) -> Self {
        Self {
            repository,
            event_log,
            verifier,
            expected_livemode: None,
        }
    }

    /// Acknowledge, without applying, events from the other mode.
    pub fn with_expected_livemode(mut self, livemode: bool) -> Self {
        self.expected_livemode = Some(livemode);
        self
    }

    pub async fn handle(
        &self,
        cmd: HandleProviderWebhookCommand,
    ) -> Result<HandleProviderWebhookResult, WebhookError> {
        // 1. Authenticate before looking at the payload
        let signature = cmd.signature.as_deref().ok_or(WebhookError::MissingSignature)?;
        self.verifier.verify(&cmd.payload, signature).map_err(|e| {
            tracing::warn!(error = %e, "webhook signature verification failed");
            e
        })?;

        // 2. Decode into a typed event
        let event = ProviderEvent::decode(&cmd.payload).map_err(|e| {
            tracing::warn!(error = %e, "webhook payload rejected");
            e
        })?;
        let event_type = event.kind.type_name().to_string();

        // 3. Skip deliveries already applied
        if self.event_log.is_processed(&event.id).await? {
            tracing::debug!(
                event_id = %event.id,
                event_type = %event_type,
                "duplicate webhook delivery"
            );
            return Ok(HandleProviderWebhookResult {
                event_id: event.id,
                event_type,
                outcome: WebhookOutcome::Duplicate,
            });
        }

        // 4. Dispatch; an event from the other mode never touches state
        let mode_mismatch = self
            .expected_livemode
            .is_some_and(|expected| expected != event.livemode);
        let outcome = match &event.kind {
            _ if mode_mismatch => {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event_type,
                    livemode = event.livemode,
                    "ignoring webhook event from the other billing mode"
                );
                WebhookOutcome::Ignored
            }
            ProviderEventKind::CheckoutCompleted(checkout) => {
                self.handle_checkout_completed(&event.id, checkout).await?
            }
            ProviderEventKind::SubscriptionCreated(change)
            | ProviderEventKind::SubscriptionUpdated(change) => {
                let status =
                    map_provider_status(&change.provider_status, ProviderSignal::SubscriptionEvent);
                self.apply_subscription(&event.id, change, status).await?
            }
            ProviderEventKind::SubscriptionDeleted(change) => {
                // Cancellation is unconditional, whatever status the object carries.
                self.apply_subscription(&event.id, change, SubscriptionStatus::Canceled)
                    .await?
            }
            ProviderEventKind::PaymentFailed(failure) => {
                self.handle_payment_failed(&event.id, failure).await?
            }
            ProviderEventKind::Unhandled(_) => {
                tracing::debug!(
                    event_id = %event.id,
                    event_type = %event_type,
                    "ignoring unhandled webhook event"
                );
                WebhookOutcome::Ignored
            }
        };

        // 5. Record only after a successful apply so failed events are retried
        self.event_log.mark_processed(&event.id, &event_type).await?;

        Ok(HandleProviderWebhookResult {
            event_id: event.id,
            event_type,
            outcome,
        })
    }

    async fn handle_checkout_completed(
        &self,
        event_id: &str,
        checkout: &CheckoutCompleted,
    ) -> Result<WebhookOutcome, WebhookError> {
        let Some(customer_ref) = checkout.customer_ref.as_deref() else {
            tracing::debug!(
                event_id,
                session_id = %checkout.session_id,
                "checkout completed without customer"
            );
            return Ok(WebhookOutcome::Acknowledged);
        };

        if self
            .repository
            .find_user_by_customer_ref(customer_ref)
            .await?
            .is_some()
        {
            return Ok(WebhookOutcome::Acknowledged);
        }

        // The issuer path was bypassed: backfill from the session's user id.
        let Some(user_id) = checkout.user_id else {
            tracing::warn!(
                event_id,
                customer_ref,
                "checkout completed for unknown customer without user id"
            );
            return Ok(WebhookOutcome::Acknowledged);
        };

        if self.repository.find_user(user_id).await?.is_none() {
            tracing::warn!(event_id, %user_id, customer_ref, "checkout completed for unknown user");
            return Ok(WebhookOutcome::Acknowledged);
        }

        if self
            .repository
            .attach_customer_ref(user_id, customer_ref)
            .await?
        {
            tracing::info!(
                event_id,
                %user_id,
                customer_ref,
                "customer ref backfilled from checkout"
            );
            Ok(WebhookOutcome::CustomerRefBackfilled { user_id })
        } else {
            tracing::warn!(
                event_id,
                %user_id,
                customer_ref,
                "checkout customer differs from the stored customer ref; leaving it untouched"
            );
            Ok(WebhookOutcome::Acknowledged)
        }
    }

    async fn apply_subscription(
        &self,
        event_id: &str,
        change: &SubscriptionChanged,
        status: SubscriptionStatus,
    ) -> Result<WebhookOutcome, WebhookError> {
        let account = self.resolve_customer(event_id, &change.customer_ref).await?;

        let snapshot = SubscriptionSnapshot {
            user_id: account.user_id,
            provider_subscription_ref: change.subscription_ref.clone(),
            status,
            current_period_start: change.current_period_start,
            current_period_end: change.current_period_end,
        };
        self.repository
            .apply_change(&EntitlementChange::from_snapshot(snapshot))
            .await?;

        tracing::info!(
            event_id,
            user_id = %account.user_id,
            subscription_ref = %change.subscription_ref,
            provider_status = %change.provider_status,
            status = %status,
            "subscription status applied"
        );

        Ok(WebhookOutcome::Applied {
            user_id: account.user_id,
            status,
        })
    }

    async fn handle_payment_failed(
        &self,
        event_id: &str,
        failure: &PaymentFailed,
    ) -> Result<WebhookOutcome, WebhookError> {
        let account = self.resolve_customer(event_id, &failure.customer_ref).await?;
        let status = map_provider_status("", ProviderSignal::PaymentFailure);

        self.repository
            .apply_change(&EntitlementChange::status_only(account.user_id, status))
            .await?;

        tracing::info!(
            event_id,
            user_id = %account.user_id,
            invoice_id = %failure.invoice_id,
            status = %status,
            "payment failure applied"
        );

        Ok(WebhookOutcome::Applied {
            user_id: account.user_id,
            status,
        })
    }

    /// Finds the owning user. Absence is retryable: the checkout's ref
    /// write may not have committed yet.
    async fn resolve_customer(
        &self,
        event_id: &str,
        customer_ref: &str,
    ) -> Result<BillingAccount, WebhookError> {
        self.repository
            .find_user_by_customer_ref(customer_ref)
            .await?
            .ok_or_else(|| {
                tracing::warn!(event_id, customer_ref, "no user owns webhook customer");
                WebhookError::CustomerNotFound(customer_ref.to_string())
            })
    }
}
