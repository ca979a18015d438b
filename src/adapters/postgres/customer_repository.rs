//! PostgreSQL implementation of CustomerRepository.
//!
//! The `customers.user_id` UNIQUE constraint enforces the one-per-user
//! invariant; `get_or_create` rides on it with `ON CONFLICT DO NOTHING` so
//! concurrent first access resolves to a single row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{CurrentSubscription, Customer, SubscriptionStatus};
use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{CustomerRepository, GetOrCreate};

/// PostgreSQL customer store.
pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a customer.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    user_id: String,
    stripe_id: String,
    card_fingerprint: String,
    card_last_4: String,
    card_kind: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DomainError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(Customer {
            id: CustomerId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            stripe_id: row.stripe_id,
            card_fingerprint: row.card_fingerprint,
            card_last_4: row.card_last_4,
            card_kind: row.card_kind,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// Database row representation of a current subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    plan: String,
    quantity: i64,
    status: String,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    amount_cents: i64,
    currency: String,
    cancel_at_period_end: bool,
    canceled_at: Option<DateTime<Utc>>,
    start_at: DateTime<Utc>,
}

impl From<SubscriptionRow> for CurrentSubscription {
    fn from(row: SubscriptionRow) -> Self {
        CurrentSubscription {
            plan: row.plan,
            quantity: row.quantity,
            status: SubscriptionStatus::parse(&row.status),
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            amount_cents: row.amount_cents,
            currency: row.currency,
            cancel_at_period_end: row.cancel_at_period_end,
            canceled_at: row.canceled_at.map(Timestamp::from_datetime),
            start: Timestamp::from_datetime(row.start_at),
        }
    }
}

fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn get_or_create(&self, candidate: Customer) -> Result<GetOrCreate, DomainError> {
        let inserted: Option<CustomerRow> = sqlx::query_as(
            r#"
            INSERT INTO customers (
                id, user_id, stripe_id, card_fingerprint, card_last_4, card_kind,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING id, user_id, stripe_id, card_fingerprint, card_last_4, card_kind,
                      created_at, updated_at
            "#,
        )
        .bind(candidate.id.as_uuid())
        .bind(candidate.user_id.as_str())
        .bind(&candidate.stripe_id)
        .bind(&candidate.card_fingerprint)
        .bind(&candidate.card_last_4)
        .bind(&candidate.card_kind)
        .bind(candidate.created_at.as_datetime())
        .bind(candidate.updated_at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert customer", e))?;

        match inserted {
            Some(row) => Ok(GetOrCreate {
                customer: row.try_into()?,
                created: true,
            }),
            None => {
                // Lost the insert race or the row predates us; fetch the winner.
                let existing = self
                    .find_by_user_id(&candidate.user_id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::DatabaseError,
                            "Customer insert conflicted but no row found",
                        )
                    })?;
                Ok(GetOrCreate {
                    customer: existing,
                    created: false,
                })
            }
        }
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, stripe_id, card_fingerprint, card_last_4, card_kind,
                   created_at, updated_at
            FROM customers
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch customer", e))?;

        row.map(Customer::try_from).transpose()
    }

    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, stripe_id, card_fingerprint, card_last_4, card_kind,
                   created_at, updated_at
            FROM customers
            WHERE stripe_id = $1
            "#,
        )
        .bind(stripe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch customer", e))?;

        row.map(Customer::try_from).transpose()
    }

    async fn update(&self, customer: &Customer) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE customers SET
                stripe_id = $2,
                card_fingerprint = $3,
                card_last_4 = $4,
                card_kind = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.stripe_id)
        .bind(&customer.card_fingerprint)
        .bind(&customer.card_last_4)
        .bind(&customer.card_kind)
        .bind(customer.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update customer", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CustomerNotFound,
                "Customer not found",
            ));
        }

        Ok(())
    }

    async fn subscription_for(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<CurrentSubscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT plan, quantity, status, current_period_start, current_period_end,
                   amount_cents, currency, cancel_at_period_end, canceled_at, start_at
            FROM current_subscriptions
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch subscription", e))?;

        Ok(row.map(CurrentSubscription::from))
    }

    async fn put_subscription(
        &self,
        customer_id: &CustomerId,
        subscription: &CurrentSubscription,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO current_subscriptions (
                customer_id, plan, quantity, status, current_period_start,
                current_period_end, amount_cents, currency, cancel_at_period_end,
                canceled_at, start_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (customer_id) DO UPDATE SET
                plan = EXCLUDED.plan,
                quantity = EXCLUDED.quantity,
                status = EXCLUDED.status,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                amount_cents = EXCLUDED.amount_cents,
                currency = EXCLUDED.currency,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                canceled_at = EXCLUDED.canceled_at,
                start_at = EXCLUDED.start_at
            "#,
        )
        .bind(customer_id.as_uuid())
        .bind(&subscription.plan)
        .bind(subscription.quantity)
        .bind(subscription.status.to_string())
        .bind(subscription.current_period_start.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(subscription.amount_cents)
        .bind(&subscription.currency)
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.canceled_at.as_ref().map(|t| *t.as_datetime()))
        .bind(subscription.start.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to store subscription", e))?;

        Ok(())
    }
}
