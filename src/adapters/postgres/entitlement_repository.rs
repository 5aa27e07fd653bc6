//! PostgreSQL implementation of EntitlementRepository.
//!
//! Users and subscriptions live in two tables. The customer ref column has a
//! partial unique index and the provider subscription ref a unique
//! constraint; every write is keyed on one of them.

use crate::domain::entitlement::{
    BillingAccount, EntitlementChange, SubscriptionRecord, SubscriptionSnapshot,
    SubscriptionStatus,
};
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, UserId};
use crate::ports::EntitlementRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

const CUSTOMER_REF_INDEX: &str = "users_billing_customer_ref_key";

/// PostgreSQL implementation of the EntitlementRepository port.
pub struct PostgresEntitlementRepository {
    pool: PgPool,
}

impl PostgresEntitlementRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user's billing fields.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    is_active: bool,
    subscription_status: String,
    billing_customer_ref: Option<String>,
}

impl TryFrom<UserRow> for BillingAccount {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(BillingAccount {
            user_id: parse_user_id(row.id)?,
            email: row.email,
            display_name: row.username,
            is_active: row.is_active,
            subscription_status: parse_status(&row.subscription_status)?,
            billing_customer_ref: row.billing_customer_ref,
        })
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: i64,
    user_id: i64,
    provider_subscription_ref: String,
    status: String,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionRecord {
            id: SubscriptionId::from_i64(row.id),
            user_id: parse_user_id(row.user_id)?,
            provider_subscription_ref: row.provider_subscription_ref,
            status: parse_status(&row.status)?,
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_user_id(raw: i64) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(|e| {
        DomainError::new(ErrorCode::DatabaseError, format!("Invalid user id: {}", e))
    })
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    s.parse::<SubscriptionStatus>().map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )
    })
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

fn user_not_found(user_id: UserId) -> DomainError {
    DomainError::new(ErrorCode::UserNotFound, format!("User {} not found", user_id))
}

const USER_COLUMNS: &str =
    "id, username, email, is_active, subscription_status, billing_customer_ref";

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, provider_subscription_ref, status, \
     current_period_start, current_period_end, created_at, updated_at";

async fn upsert_subscription(
    tx: &mut Transaction<'_, Postgres>,
    snapshot: &SubscriptionSnapshot,
) -> Result<SubscriptionRecord, DomainError> {
    let query = format!(
        r#"
        INSERT INTO subscriptions (
            user_id, provider_subscription_ref, status, current_period_start, current_period_end
        ) VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (provider_subscription_ref) DO UPDATE SET
            user_id = EXCLUDED.user_id,
            status = EXCLUDED.status,
            current_period_start = EXCLUDED.current_period_start,
            current_period_end = EXCLUDED.current_period_end,
            updated_at = NOW()
        RETURNING {}
        "#,
        SUBSCRIPTION_COLUMNS
    );

    let row = sqlx::query_as::<_, SubscriptionRow>(&query)
        .bind(snapshot.user_id.as_i64())
        .bind(&snapshot.provider_subscription_ref)
        .bind(snapshot.status.as_str())
        .bind(snapshot.current_period_start.as_datetime())
        .bind(snapshot.current_period_end.as_datetime())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| db_error("Failed to upsert subscription", e))?;

    row.try_into()
}

#[async_trait]
impl EntitlementRepository for PostgresEntitlementRepository {
    async fn find_user(&self, user_id: UserId) -> Result<Option<BillingAccount>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(user_id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load user", e))?;

        row.map(BillingAccount::try_from).transpose()
    }

    async fn find_user_by_customer_ref(
        &self,
        customer_ref: &str,
    ) -> Result<Option<BillingAccount>, DomainError> {
        // Served by the partial unique index on billing_customer_ref.
        let query = format!(
            "SELECT {} FROM users WHERE billing_customer_ref = $1",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(customer_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to resolve customer ref", e))?;

        row.map(BillingAccount::try_from).transpose()
    }

    async fn attach_customer_ref(
        &self,
        user_id: UserId,
        customer_ref: &str,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET billing_customer_ref = $2, updated_at = NOW()
            WHERE id = $1 AND (billing_customer_ref IS NULL OR billing_customer_ref = '')
            "#,
        )
        .bind(user_id.as_i64())
        .bind(customer_ref)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(CUSTOMER_REF_INDEX) {
                    return DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Customer ref {} already belongs to another user", customer_ref),
                    );
                }
            }
            db_error("Failed to attach customer ref", e)
        })?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id.as_i64())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to check user", e))?;

        if exists {
            Ok(false)
        } else {
            Err(user_not_found(user_id))
        }
    }

    async fn users_with_customer_ref(&self) -> Result<Vec<BillingAccount>, DomainError> {
        let query = format!(
            "SELECT {} FROM users \
             WHERE billing_customer_ref IS NOT NULL AND billing_customer_ref <> '' \
             ORDER BY id",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list billing users", e))?;

        rows.into_iter().map(BillingAccount::try_from).collect()
    }

    async fn apply_change(
        &self,
        change: &EntitlementChange,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let updated = sqlx::query(
            "UPDATE users SET subscription_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(change.user_id.as_i64())
        .bind(change.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to update user status", e))?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(user_not_found(change.user_id));
        }

        let stored = match &change.subscription {
            Some(snapshot) => Some(upsert_subscription(&mut tx, snapshot).await?),
            None => None,
        };

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit entitlement change", e))?;

        Ok(stored)
    }

    async fn find_subscription(
        &self,
        provider_subscription_ref: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let query = format!(
            "SELECT {} FROM subscriptions WHERE provider_subscription_ref = $1",
            SUBSCRIPTION_COLUMNS
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&query)
            .bind(provider_subscription_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load subscription", e))?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn current_subscription(
        &self,
        user_id: UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let query = format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1",
            SUBSCRIPTION_COLUMNS
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&query)
            .bind(user_id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load current subscription", e))?;

        row.map(SubscriptionRecord::try_from).transpose()
    }
}
