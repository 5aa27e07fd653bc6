//! Mock billing provider for testing.
//!
//! Provides a scriptable implementation of `BillingProvider` for unit and
//! integration tests. Supports:
//! - Per-customer subscription lists
//! - Error injection (one-shot or per method)
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{
    BillingProvider, CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest,
    ProviderCustomer, ProviderError, ProviderSubscription,
};

/// Mock billing provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockBillingProvider::new();
/// mock.set_subscriptions("cus_1", vec![subscription]);
/// mock.set_method_error("list_subscriptions", ProviderError::timeout("slow"));
/// ```
#[derive(Default, Clone)]
pub struct MockBillingProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Subscriptions reported per customer ref.
    subscriptions: HashMap<String, Vec<ProviderSubscription>>,

    /// Customers created so far, keyed by idempotency key when present.
    customers_by_key: HashMap<String, ProviderCustomer>,

    next_customer_seq: u64,
    next_session_seq: u64,

    /// Error to return on next call (consumed).
    next_error: Option<ProviderError>,

    /// Specific errors by method name (sticky).
    method_errors: HashMap<String, ProviderError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Replace the subscriptions the provider reports for a customer.
    pub fn set_subscriptions(&self, customer_ref: &str, subscriptions: Vec<ProviderSubscription>) {
        self.inner
            .lock()
            .unwrap()
            .subscriptions
            .insert(customer_ref.to_string(), subscriptions);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: ProviderError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Set an error for a specific method until cleared.
    pub fn set_method_error(&self, method: &str, error: ProviderError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), ProviderError> {
        let mut state = self.inner.lock().unwrap();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

#[async_trait]
impl BillingProvider for MockBillingProvider {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<ProviderCustomer, ProviderError> {
        self.record_call(
            "create_customer",
            vec![request.user_id.to_string(), request.email.clone()],
        );
        self.check_error("create_customer")?;

        let mut state = self.inner.lock().unwrap();

        // Same idempotency key, same customer, like the real provider.
        if let Some(existing) = request
            .idempotency_key
            .as_ref()
            .and_then(|key| state.customers_by_key.get(key))
        {
            return Ok(existing.clone());
        }

        state.next_customer_seq += 1;
        let customer = ProviderCustomer {
            id: format!("cus_mock_{}", state.next_customer_seq),
            email: Some(request.email),
        };

        if let Some(key) = request.idempotency_key {
            state.customers_by_key.insert(key, customer.clone());
        }

        Ok(customer)
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, ProviderError> {
        self.record_call(
            "create_checkout_session",
            vec![
                request.customer_ref.clone(),
                request.price_id.clone(),
                request.success_url.clone(),
                request.cancel_url.clone(),
            ],
        );
        self.check_error("create_checkout_session")?;

        let mut state = self.inner.lock().unwrap();
        state.next_session_seq += 1;
        let id = format!("cs_mock_{}", state.next_session_seq);

        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{}", id),
            id,
        })
    }

    async fn list_subscriptions(
        &self,
        customer_ref: &str,
    ) -> Result<Vec<ProviderSubscription>, ProviderError> {
        self.record_call("list_subscriptions", vec![customer_ref.to_string()]);
        self.check_error("list_subscriptions")?;

        let state = self.inner.lock().unwrap();
        Ok(state
            .subscriptions
            .get(customer_ref)
            .cloned()
            .unwrap_or_default())
    }
}
