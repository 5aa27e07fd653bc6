//! PostgreSQL implementation of ProcessedEventLog.

use crate::domain::foundation::DomainError;
use crate::ports::ProcessedEventLog;
use async_trait::async_trait;
use sqlx::PgPool;

/// Records applied webhook event ids in `processed_webhook_events`.
pub struct PostgresProcessedEventLog {
    pool: PgPool,
}

impl PostgresProcessedEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcessedEventLog for PostgresProcessedEventLog {
    async fn is_processed(&self, event_id: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM processed_webhook_events WHERE event_id = $1)",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to check processed event: {}", e)))
    }

    async fn mark_processed(&self, event_id: &str, event_type: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO processed_webhook_events (event_id, event_type)
            VALUES ($1, $2)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record processed event: {}", e)))?;

        Ok(())
    }
}
