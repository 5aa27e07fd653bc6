//! Webhook error types for provider webhook handling.
//!
//! Each variant carries the HTTP status the provider sees. 4xx marks a
//! delivery this endpoint will never accept (bad signature or shape); 5xx
//! marks a transient failure worth redelivering. The provider retries any
//! non-2xx response, so a 4xx is a rejection, not an acknowledgement.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The signature header was absent.
    #[error("Missing signature header")]
    MissingSignature,

    /// The signature header could not be parsed.
    #[error("Malformed signature header: {0}")]
    MalformedSignature(String),

    /// No signature in the header matched the payload.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is older than the replay window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// The payload did not match the shape expected for its event type.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Required field missing from an otherwise well-formed payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// No local user owns the customer ref. The ref write may not have
    /// committed yet, so the provider should redeliver.
    #[error("No user for customer {0}")]
    CustomerNotFound(String),

    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// True for signature and timestamp failures. These are never processed.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSignature
                | WebhookError::MalformedSignature(_)
                | WebhookError::InvalidSignature
                | WebhookError::TimestampOutOfRange
                | WebhookError::InvalidTimestamp
        )
    }

    /// Returns true if a redelivery of the same event can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_) | WebhookError::CustomerNotFound(_)
        )
    }

    /// Maps the error to the HTTP status returned to the provider.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Authentication and validation failures: rejected on every attempt
            WebhookError::MissingSignature
            | WebhookError::MalformedSignature(_)
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::MalformedPayload(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,

            // Server errors - will retry
            WebhookError::CustomerNotFound(_) | WebhookError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable code for the JSON error body.
    pub fn code(&self) -> &'static str {
        if self.is_authentication_failure() {
            "AUTHENTICATION_FAILED"
        } else if self.is_retryable() {
            "PROCESSING_FAILED"
        } else {
            "VALIDATION_FAILED"
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::CustomerNotFound => WebhookError::CustomerNotFound(err.message),
            _ => WebhookError::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Error Display Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn invalid_signature_displays_correctly() {
        let err = WebhookError::InvalidSignature;
        assert_eq!(format!("{}", err), "Invalid signature");
    }

    #[test]
    fn malformed_payload_displays_message() {
        let err = WebhookError::MalformedPayload("missing field `customer`".to_string());
        assert_eq!(
            format!("{}", err),
            "Malformed payload: missing field `customer`"
        );
    }

    #[test]
    fn customer_not_found_displays_ref() {
        let err = WebhookError::CustomerNotFound("cus_123".to_string());
        assert_eq!(format!("{}", err), "No user for customer cus_123");
    }

    // ══════════════════════════════════════════════════════════════
    // Retryability Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn database_error_is_retryable() {
        assert!(WebhookError::Database("connection failed".to_string()).is_retryable());
    }

    #[test]
    fn unknown_customer_is_retryable() {
        assert!(WebhookError::CustomerNotFound("cus_1".to_string()).is_retryable());
    }

    #[test]
    fn authentication_failures_are_not_retryable() {
        for err in [
            WebhookError::MissingSignature,
            WebhookError::MalformedSignature("no t".to_string()),
            WebhookError::InvalidSignature,
            WebhookError::TimestampOutOfRange,
            WebhookError::InvalidTimestamp,
        ] {
            assert!(err.is_authentication_failure());
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn malformed_payload_is_not_retryable() {
        assert!(!WebhookError::MalformedPayload("bad json".to_string()).is_retryable());
        assert!(!WebhookError::MissingField("customer").is_retryable());
    }

    // ══════════════════════════════════════════════════════════════
    // Status Code Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn invalid_signature_returns_bad_request() {
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::TimestampOutOfRange.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn malformed_payload_returns_bad_request() {
        let err = WebhookError::MalformedPayload("syntax error".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }

    #[test]
    fn retryable_errors_return_internal_error() {
        let err = WebhookError::CustomerNotFound("cus_9".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "PROCESSING_FAILED");

        let err = WebhookError::Database("connection lost".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn domain_customer_not_found_converts_to_retryable_error() {
        let err: WebhookError =
            DomainError::new(ErrorCode::CustomerNotFound, "cus_404").into();
        assert!(matches!(err, WebhookError::CustomerNotFound(ref c) if c == "cus_404"));
    }
}
