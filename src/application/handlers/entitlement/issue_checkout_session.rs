//! IssueCheckoutSessionHandler - Command handler for starting a hosted checkout.

use std::sync::Arc;

use crate::domain::entitlement::{BillingAccount, EntitlementError};
use crate::domain::foundation::UserId;
use crate::ports::{BillingProvider, CreateCheckoutRequest, CreateCustomerRequest, EntitlementRepository};

/// Placeholder the provider replaces with the real session id on redirect.
const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Command to start a checkout for the authenticated user.
#[derive(Debug, Clone)]
pub struct IssueCheckoutSessionCommand {
    pub user_id: UserId,
}

/// Result of successful checkout issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCheckoutSessionResult {
    pub checkout_url: String,
    pub session_id: String,
    pub customer_ref: String,
    /// True when this call created the provider customer.
    pub customer_created: bool,
}

/// Price and redirect targets every checkout is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutSettings {
    /// Derives the success and cancel pages from the frontend base URL.
    pub fn from_redirect_base(price_id: impl Into<String>, redirect_base_url: &str) -> Self {
        let base = redirect_base_url.trim_end_matches('/');
        Self {
            price_id: price_id.into(),
            success_url: format!(
                "{}/subscription/success?session_id={}",
                base, SESSION_ID_PLACEHOLDER
            ),
            cancel_url: format!("{}/subscription/cancel", base),
        }
    }
}

/// Handler for issuing checkout sessions.
///
/// Creates the provider customer on first use and persists its ref only
/// after the provider confirmed it, so a failed call leaves no local state.
pub struct IssueCheckoutSessionHandler {
    repository: Arc<dyn EntitlementRepository>,
    provider: Arc<dyn BillingProvider>,
    settings: CheckoutSettings,
}

impl IssueCheckoutSessionHandler {
    pub fn new(
        repository: Arc<dyn EntitlementRepository>,
        provider: Arc<dyn BillingProvider>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            repository,
            provider,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: IssueCheckoutSessionCommand,
    ) -> Result<IssueCheckoutSessionResult, EntitlementError> {
        if self.settings.price_id.trim().is_empty() {
            return Err(EntitlementError::validation(
                "price_id",
                "no subscription price is configured",
            ));
        }

        // 1. Load and check the account
        let account = self
            .repository
            .find_user(cmd.user_id)
            .await?
            .ok_or_else(|| EntitlementError::user_not_found(cmd.user_id))?;

        if !account.is_active {
            return Err(EntitlementError::account_deactivated(cmd.user_id));
        }

        // 2. Reuse or create the provider customer
        let (customer_ref, customer_created) = match account.customer_ref() {
            Some(existing) => (existing.to_string(), false),
            None => self.create_customer(&account).await?,
        };

        // 3. Open the hosted checkout
        let session = self
            .provider
            .create_checkout_session(CreateCheckoutRequest {
                user_id: cmd.user_id,
                customer_ref: customer_ref.clone(),
                price_id: self.settings.price_id.clone(),
                success_url: self.settings.success_url.clone(),
                cancel_url: self.settings.cancel_url.clone(),
            })
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %cmd.user_id, customer_ref = %customer_ref, error = %e, "checkout session creation failed");
                EntitlementError::from(e)
            })?;

        tracing::info!(
            user_id = %cmd.user_id,
            customer_ref = %customer_ref,
            session_id = %session.id,
            customer_created,
            "checkout session issued"
        );

        Ok(IssueCheckoutSessionResult {
            checkout_url: session.url,
            session_id: session.id,
            customer_ref,
            customer_created,
        })
    }

    /// Creates the provider customer and records its ref on the account.
    ///
    /// When a concurrent checkout attached a ref first, the stored ref wins.
    async fn create_customer(
        &self,
        account: &BillingAccount,
    ) -> Result<(String, bool), EntitlementError> {
        let name = Some(account.display_name.clone()).filter(|n| !n.trim().is_empty());

        let customer = self
            .provider
            .create_customer(CreateCustomerRequest {
                user_id: account.user_id,
                email: account.email.clone(),
                name,
                idempotency_key: Some(format!("customer-{}", account.user_id)),
            })
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %account.user_id, error = %e, "provider customer creation failed");
                EntitlementError::from(e)
            })?;

        if self
            .repository
            .attach_customer_ref(account.user_id, &customer.id)
            .await?
        {
            return Ok((customer.id, true));
        }

        let stored = self
            .repository
            .find_user(account.user_id)
            .await?
            .and_then(|a| a.customer_ref().map(str::to_string));

        match stored {
            Some(existing) => {
                tracing::info!(
                    user_id = %account.user_id,
                    customer_ref = %existing,
                    discarded_ref = %customer.id,
                    "customer ref already attached by a concurrent checkout"
                );
                Ok((existing, false))
            }
            None => Err(EntitlementError::infrastructure(format!(
                "customer ref for user {} was neither attached nor found",
                account.user_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryEntitlementStore;
    use crate::adapters::stripe::MockBillingProvider;
    use crate::domain::entitlement::{EntitlementChange, SubscriptionRecord};
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::ports::ProviderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn settings() -> CheckoutSettings {
        CheckoutSettings::from_redirect_base("price_monthly", "https://app.example.com/")
    }

    fn user(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn setup(
        account: BillingAccount,
    ) -> (IssueCheckoutSessionHandler, InMemoryEntitlementStore, MockBillingProvider) {
        let store = InMemoryEntitlementStore::new();
        store.insert_user(account).await;
        let provider = MockBillingProvider::new();
        let handler = IssueCheckoutSessionHandler::new(
            Arc::new(store.clone()),
            Arc::new(provider.clone()),
            settings(),
        );
        (handler, store, provider)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    /// Repository where another checkout always wins the attach race.
    struct RacingRepository {
        account: BillingAccount,
        winner_ref: String,
        attach_calls: Mutex<u32>,
    }

    #[async_trait]
    impl EntitlementRepository for RacingRepository {
        async fn find_user(&self, _user_id: UserId) -> Result<Option<BillingAccount>, DomainError> {
            let calls = *self.attach_calls.lock().unwrap();
            if calls == 0 {
                Ok(Some(self.account.clone()))
            } else {
                Ok(Some(self.account.clone().with_customer_ref(self.winner_ref.clone())))
            }
        }

        async fn find_user_by_customer_ref(
            &self,
            _customer_ref: &str,
        ) -> Result<Option<BillingAccount>, DomainError> {
            Ok(None)
        }

        async fn attach_customer_ref(
            &self,
            _user_id: UserId,
            _customer_ref: &str,
        ) -> Result<bool, DomainError> {
            *self.attach_calls.lock().unwrap() += 1;
            Ok(false)
        }

        async fn users_with_customer_ref(&self) -> Result<Vec<BillingAccount>, DomainError> {
            Ok(vec![])
        }

        async fn apply_change(
            &self,
            _change: &EntitlementChange,
        ) -> Result<Option<SubscriptionRecord>, DomainError> {
            Err(DomainError::new(ErrorCode::InternalError, "not used"))
        }

        async fn find_subscription(
            &self,
            _provider_subscription_ref: &str,
        ) -> Result<Option<SubscriptionRecord>, DomainError> {
            Ok(None)
        }

        async fn current_subscription(
            &self,
            _user_id: UserId,
        ) -> Result<Option<SubscriptionRecord>, DomainError> {
            Ok(None)
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn settings_build_redirect_targets() {
        let settings = settings();
        assert_eq!(
            settings.success_url,
            "https://app.example.com/subscription/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(settings.cancel_url, "https://app.example.com/subscription/cancel");
    }

    #[tokio::test]
    async fn first_checkout_creates_and_attaches_customer() {
        let (handler, store, provider) =
            setup(BillingAccount::new(user(1), "ann@example.com", "ann")).await;

        let result = handler
            .handle(IssueCheckoutSessionCommand { user_id: user(1) })
            .await
            .unwrap();

        assert!(result.customer_created);
        assert!(result.checkout_url.starts_with("https://checkout.stripe.com/"));
        let stored = store.user(user(1)).await.unwrap();
        assert_eq!(stored.customer_ref(), Some(result.customer_ref.as_str()));
        assert_eq!(provider.call_count("create_customer"), 1);
        assert_eq!(provider.call_count("create_checkout_session"), 1);
    }

    #[tokio::test]
    async fn existing_customer_is_reused() {
        let (handler, _store, provider) = setup(
            BillingAccount::new(user(2), "bo@example.com", "bo").with_customer_ref("cus_existing"),
        )
        .await;

        let result = handler
            .handle(IssueCheckoutSessionCommand { user_id: user(2) })
            .await
            .unwrap();

        assert!(!result.customer_created);
        assert_eq!(result.customer_ref, "cus_existing");
        assert!(!provider.was_called("create_customer"));
        let call = &provider.calls()[0];
        assert_eq!(call.args[0], "cus_existing");
        assert_eq!(call.args[1], "price_monthly");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (handler, _store, provider) =
            setup(BillingAccount::new(user(1), "ann@example.com", "ann")).await;

        let err = handler
            .handle(IssueCheckoutSessionCommand { user_id: user(99) })
            .await
            .unwrap_err();

        assert_eq!(err, EntitlementError::user_not_found(user(99)));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn deactivated_account_is_rejected() {
        let (handler, _store, provider) =
            setup(BillingAccount::new(user(3), "cy@example.com", "cy").deactivated()).await;

        let err = handler
            .handle(IssueCheckoutSessionCommand { user_id: user(3) })
            .await
            .unwrap_err();

        assert!(matches!(err, EntitlementError::AccountDeactivated(_)));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_commits_no_customer_ref() {
        let (handler, store, provider) =
            setup(BillingAccount::new(user(4), "di@example.com", "di")).await;
        provider.set_method_error("create_customer", ProviderError::timeout("took too long"));

        let err = handler
            .handle(IssueCheckoutSessionCommand { user_id: user(4) })
            .await
            .unwrap_err();

        assert!(matches!(err, EntitlementError::ProviderUnavailable(_)));
        assert!(err.is_retryable());
        assert!(store.user(user(4)).await.unwrap().customer_ref().is_none());
    }

    #[tokio::test]
    async fn checkout_failure_keeps_created_customer() {
        let (handler, store, provider) =
            setup(BillingAccount::new(user(5), "ed@example.com", "ed")).await;
        provider.set_method_error(
            "create_checkout_session",
            ProviderError::provider("upstream 503"),
        );

        let err = handler
            .handle(IssueCheckoutSessionCommand { user_id: user(5) })
            .await
            .unwrap_err();
        assert!(matches!(err, EntitlementError::ProviderUnavailable(_)));

        // The customer was confirmed by the provider, so its ref stays.
        assert!(store.user(user(5)).await.unwrap().customer_ref().is_some());

        provider.clear_errors();
        let retry = handler
            .handle(IssueCheckoutSessionCommand { user_id: user(5) })
            .await
            .unwrap();
        assert!(!retry.customer_created);
        assert_eq!(provider.call_count("create_customer"), 1);
    }

    #[tokio::test]
    async fn lost_attach_race_uses_stored_ref() {
        let repository = Arc::new(RacingRepository {
            account: BillingAccount::new(user(6), "fay@example.com", "fay"),
            winner_ref: "cus_winner".to_string(),
            attach_calls: Mutex::new(0),
        });
        let handler = IssueCheckoutSessionHandler::new(
            repository,
            Arc::new(MockBillingProvider::new()),
            settings(),
        );

        let result = handler
            .handle(IssueCheckoutSessionCommand { user_id: user(6) })
            .await
            .unwrap();

        assert_eq!(result.customer_ref, "cus_winner");
        assert!(!result.customer_created);
    }

    #[tokio::test]
    async fn missing_price_is_a_validation_error() {
        let store = InMemoryEntitlementStore::new();
        store
            .insert_user(BillingAccount::new(user(7), "gus@example.com", "gus"))
            .await;
        let handler = IssueCheckoutSessionHandler::new(
            Arc::new(store),
            Arc::new(MockBillingProvider::new()),
            CheckoutSettings::from_redirect_base("", "https://app.example.com"),
        );

        let err = handler
            .handle(IssueCheckoutSessionCommand { user_id: user(7) })
            .await
            .unwrap_err();

        assert!(matches!(err, EntitlementError::ValidationFailed { .. }));
    }
}
