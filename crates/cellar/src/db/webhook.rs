//! Database operations for the outgoing webhook queue.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cider_cellar_core::{DeliveryStatus, WebhookDeliveryId};

use super::RepositoryError;
use crate::models::WebhookDelivery;

const DELIVERY_COLUMNS: &str = "
    id, event_type, payload, status, attempts, next_attempt_at,
    last_error, created_at, delivered_at";

/// Internal row type for delivery queries.
#[derive(Debug, sqlx::FromRow)]
struct WebhookDeliveryRow {
    id: i32,
    event_type: String,
    payload: serde_json::Value,
    status: DeliveryStatus,
    attempts: i32,
    next_attempt_at: DateTime<Utc>,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
}

impl From<WebhookDeliveryRow> for WebhookDelivery {
    fn from(row: WebhookDeliveryRow) -> Self {
        Self {
            id: WebhookDeliveryId::new(row.id),
            event_type: row.event_type,
            payload: row.payload,
            status: row.status,
            attempts: row.attempts,
            next_attempt_at: row.next_attempt_at,
            last_error: row.last_error,
            created_at: row.created_at,
            delivered_at: row.delivered_at,
        }
    }
}

/// Repository for webhook delivery records.
pub struct WebhookDeliveryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WebhookDeliveryRepository<'a> {
    /// Create a new webhook delivery repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Queue a delivery for immediate sending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn enqueue(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<WebhookDelivery, RepositoryError> {
        let row: WebhookDeliveryRow = sqlx::query_as(&format!(
            "INSERT INTO webhook_delivery (event_type, payload)
            VALUES ($1, $2)
            RETURNING {DELIVERY_COLUMNS}"
        ))
        .bind(event_type)
        .bind(payload)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Pending deliveries whose next attempt is due, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<WebhookDelivery>, RepositoryError> {
        let rows: Vec<WebhookDeliveryRow> = sqlx::query_as(&format!(
            "SELECT {DELIVERY_COLUMNS}
            FROM webhook_delivery
            WHERE status = 'pending' AND next_attempt_at <= $1
            ORDER BY next_attempt_at ASC, id ASC
            LIMIT $2"
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Record a successful attempt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_delivered(
        &self,
        id: WebhookDeliveryId,
        attempts: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE webhook_delivery
            SET status = 'delivered', attempts = $2, last_error = NULL, delivered_at = NOW()
            WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(attempts)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Record a failed attempt that will be retried at `next_attempt_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn reschedule(
        &self,
        id: WebhookDeliveryId,
        attempts: i32,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE webhook_delivery
            SET attempts = $2, last_error = $3, next_attempt_at = $4
            WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(attempts)
        .bind(error)
        .bind(next_attempt_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Record a final failed attempt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_failed(
        &self,
        id: WebhookDeliveryId,
        attempts: i32,
        error: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE webhook_delivery
            SET status = 'failed', attempts = $2, last_error = $3
            WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(attempts)
        .bind(error)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
