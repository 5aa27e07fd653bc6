//! PostgreSQL implementation of EntitlementReader.
//!
//! A single-column primary key read, issued on every gate check.

use crate::domain::entitlement::SubscriptionStatus;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::EntitlementReader;
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL implementation of the EntitlementReader port.
pub struct PostgresEntitlementReader {
    pool: PgPool,
}

impl PostgresEntitlementReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntitlementReader for PostgresEntitlementReader {
    async fn subscription_status(
        &self,
        user_id: UserId,
    ) -> Result<Option<SubscriptionStatus>, DomainError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT subscription_status FROM users WHERE id = $1")
                .bind(user_id.as_i64())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to read subscription status: {}", e))
                })?;

        status
            .map(|s| {
                s.parse::<SubscriptionStatus>().map_err(|_| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Invalid status value: {}", s),
                    )
                })
            })
            .transpose()
    }
}
