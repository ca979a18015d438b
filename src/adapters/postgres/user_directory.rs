//! PostgreSQL implementation of UserDirectory.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{UserAttribute, UserDirectory};

/// PostgreSQL user directory.
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn is_taken(&self, attribute: UserAttribute, value: &str) -> Result<bool, DomainError> {
        // Attribute names map to a fixed set of columns; no dynamic SQL.
        let query = match attribute {
            UserAttribute::Username => "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
            UserAttribute::Email => "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        };

        sqlx::query_scalar(query)
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to check {} availability: {}", attribute.column(), e),
                )
            })
    }
}
