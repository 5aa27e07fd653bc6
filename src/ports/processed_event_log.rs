//! Processed webhook event log.
//!
//! Records provider event ids after they were applied successfully, so a
//! redelivered event is acknowledged without being applied again. Only
//! successful applies are recorded; a failed event is retried in full.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Port for tracking which provider events have been applied.
///
/// # Example
///
/// ```ignore
/// if log.is_processed(&event.id).await? {
///     return Ok(WebhookOutcome::Duplicate);
/// }
///
/// // apply event...
///
/// log.mark_processed(&event.id, event.kind.type_name()).await?;
/// ```
#[async_trait]
pub trait ProcessedEventLog: Send + Sync {
    /// Returns `true` if the event was already applied.
    async fn is_processed(&self, event_id: &str) -> Result<bool, DomainError>;

    /// Record a successfully applied event. Recording twice is not an error.
    async fn mark_processed(&self, event_id: &str, event_type: &str) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_event_log_is_object_safe() {
        fn _accepts_dyn(_log: &dyn ProcessedEventLog) {}
    }
}
