//! PostgreSQL implementation of EventRepository.
//!
//! The PRIMARY KEY on `events.stripe_id` arbitrates concurrent duplicate
//! webhook deliveries: `ON CONFLICT DO NOTHING` turns the losing insert into
//! `SaveResult::AlreadyExists`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{EventRecord, EventRepository, ExceptionRecord, SaveResult};

/// PostgreSQL webhook event log.
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an event.
#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    stripe_id: String,
    kind: String,
    livemode: bool,
    payload: serde_json::Value,
    valid: Option<bool>,
    processed: bool,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for EventRecord {
    fn from(row: EventRow) -> Self {
        EventRecord {
            stripe_id: row.stripe_id,
            kind: row.kind,
            livemode: row.livemode,
            payload: row.payload,
            valid: row.valid,
            processed: row.processed,
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn find_by_stripe_id(
        &self,
        stripe_id: &str,
    ) -> Result<Option<EventRecord>, DomainError> {
        let row: Option<EventRow> = sqlx::query_as(
            r#"
            SELECT stripe_id, kind, livemode, payload, valid, processed, created_at
            FROM events
            WHERE stripe_id = $1
            "#,
        )
        .bind(stripe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch event", e))?;

        Ok(row.map(EventRecord::from))
    }

    async fn save(&self, record: EventRecord) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO events (stripe_id, kind, livemode, payload, valid, processed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (stripe_id) DO NOTHING
            "#,
        )
        .bind(&record.stripe_id)
        .bind(&record.kind)
        .bind(record.livemode)
        .bind(&record.payload)
        .bind(record.valid)
        .bind(record.processed)
        .bind(record.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert event", e))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn mark_valid(&self, stripe_id: &str, valid: bool) -> Result<(), DomainError> {
        sqlx::query("UPDATE events SET valid = $2 WHERE stripe_id = $1")
            .bind(stripe_id)
            .bind(valid)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to mark event validity", e))?;
        Ok(())
    }

    async fn mark_processed(&self, stripe_id: &str) -> Result<(), DomainError> {
        sqlx::query("UPDATE events SET processed = TRUE WHERE stripe_id = $1")
            .bind(stripe_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to mark event processed", e))?;
        Ok(())
    }

    async fn record_exception(&self, exception: ExceptionRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO event_processing_exceptions (payload, message, traceback, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&exception.payload)
        .bind(&exception.message)
        .bind(&exception.traceback)
        .bind(exception.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record exception", e))?;
        Ok(())
    }
}
