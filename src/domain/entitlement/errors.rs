//! Entitlement error types for checkout, gating, and reconciliation.
//!
//! Webhook failures have their own type (`WebhookError`) because their
//! contract is the HTTP status the provider sees.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | UserNotFound | 404 |
//! | AccountDeactivated | 403 |
//! | SubscriptionRequired | 403 |
//! | ProviderUnavailable | 503 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, UserId};

/// Errors surfaced by entitlement operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    /// The user does not exist.
    UserNotFound(UserId),

    /// The account was deactivated and may not start a checkout.
    AccountDeactivated(UserId),

    /// The gate denied a gated action. A business outcome, not a fault.
    SubscriptionRequired { action: String },

    /// The billing provider failed or timed out. Safe to retry.
    ProviderUnavailable(String),

    /// Input failed validation.
    ValidationFailed { field: String, message: String },

    /// Store or other infrastructure failure.
    Infrastructure(String),
}

impl EntitlementError {
    pub fn user_not_found(user_id: UserId) -> Self {
        EntitlementError::UserNotFound(user_id)
    }

    pub fn account_deactivated(user_id: UserId) -> Self {
        EntitlementError::AccountDeactivated(user_id)
    }

    pub fn subscription_required(action: impl Into<String>) -> Self {
        EntitlementError::SubscriptionRequired {
            action: action.into(),
        }
    }

    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        EntitlementError::ProviderUnavailable(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EntitlementError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        EntitlementError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EntitlementError::UserNotFound(_) => ErrorCode::UserNotFound,
            EntitlementError::AccountDeactivated(_) => ErrorCode::AccountDeactivated,
            EntitlementError::SubscriptionRequired { .. } => ErrorCode::SubscriptionRequired,
            EntitlementError::ProviderUnavailable(_) => ErrorCode::ProviderUnavailable,
            EntitlementError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            EntitlementError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            EntitlementError::UserNotFound(user_id) => format!("User {} not found", user_id),
            EntitlementError::AccountDeactivated(user_id) => {
                format!("Account {} is deactivated", user_id)
            }
            EntitlementError::SubscriptionRequired { action } => {
                format!("active subscription required to {}", action)
            }
            EntitlementError::ProviderUnavailable(msg) => {
                format!("Billing provider unavailable: {}", msg)
            }
            EntitlementError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            EntitlementError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EntitlementError::ProviderUnavailable(_) | EntitlementError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for EntitlementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for EntitlementError {}

impl From<DomainError> for EntitlementError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => EntitlementError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => EntitlementError::Infrastructure(err.to_string()),
        }
    }
}

impl From<EntitlementError> for DomainError {
    fn from(err: EntitlementError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user_id() -> UserId {
        UserId::new(42).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Messages
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn subscription_required_message_names_the_action() {
        let err = EntitlementError::subscription_required("create posts");
        assert_eq!(err.to_string(), "active subscription required to create posts");
        assert_eq!(err.code(), ErrorCode::SubscriptionRequired);
    }

    #[test]
    fn user_not_found_message_includes_id() {
        let err = EntitlementError::user_not_found(test_user_id());
        assert_eq!(err.to_string(), "User 42 not found");
    }

    // ════════════════════════════════════════════════════════════════════════
    // Retryability
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn provider_and_infrastructure_errors_are_retryable() {
        assert!(EntitlementError::provider_unavailable("timeout").is_retryable());
        assert!(EntitlementError::infrastructure("db down").is_retryable());
    }

    #[test]
    fn business_outcomes_are_not_retryable() {
        assert!(!EntitlementError::subscription_required("create replies").is_retryable());
        assert!(!EntitlementError::user_not_found(test_user_id()).is_retryable());
        assert!(!EntitlementError::account_deactivated(test_user_id()).is_retryable());
    }

    // ════════════════════════════════════════════════════════════════════════
    // Conversions
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn database_domain_error_becomes_infrastructure() {
        let err: EntitlementError = DomainError::database("pool timed out").into();
        assert!(matches!(err, EntitlementError::Infrastructure(_)));
    }

    #[test]
    fn validation_domain_error_keeps_field() {
        let err: EntitlementError = DomainError::validation("price_id", "missing").into();
        assert_eq!(
            err,
            EntitlementError::ValidationFailed {
                field: "price_id".to_string(),
                message: "missing".to_string()
            }
        );
    }

    #[test]
    fn converts_into_domain_error_with_code() {
        let err: DomainError = EntitlementError::account_deactivated(test_user_id()).into();
        assert_eq!(err.code, ErrorCode::AccountDeactivated);
    }
}
