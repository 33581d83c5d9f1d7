//! Database operations for low-stock thresholds.

use sqlx::PgPool;

use cider_cellar_core::{BlendBatchId, InventoryThresholdId};

use super::RepositoryError;
use crate::models::{InventoryThreshold, UpsertThresholdInput};

/// Internal row type for threshold queries.
#[derive(Debug, sqlx::FromRow)]
struct InventoryThresholdRow {
    id: i32,
    blend_batch_id: i32,
    location: String,
    min_quantity_75cl: i32,
    min_quantity_150cl: i32,
    alert_enabled: bool,
}

impl From<InventoryThresholdRow> for InventoryThreshold {
    fn from(row: InventoryThresholdRow) -> Self {
        Self {
            id: InventoryThresholdId::new(row.id),
            blend_batch_id: BlendBatchId::new(row.blend_batch_id),
            location: row.location,
            min_quantity_75cl: row.min_quantity_75cl,
            min_quantity_150cl: row.min_quantity_150cl,
            alert_enabled: row.alert_enabled,
        }
    }
}

/// Repository for threshold database operations.
pub struct ThresholdRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ThresholdRepository<'a> {
    /// Create a new threshold repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all thresholds in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_thresholds(&self) -> Result<Vec<InventoryThreshold>, RepositoryError> {
        let rows: Vec<InventoryThresholdRow> = sqlx::query_as(
            "SELECT id, blend_batch_id, location, min_quantity_75cl, min_quantity_150cl,
                alert_enabled
            FROM inventory_threshold
            ORDER BY id ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create or replace the threshold for a (blend, location) pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidInput` for negative minimums, or
    /// `RepositoryError::Database` if the query fails.
    pub async fn upsert_threshold(
        &self,
        input: &UpsertThresholdInput,
    ) -> Result<InventoryThreshold, RepositoryError> {
        if input.min_quantity_75cl < 0 || input.min_quantity_150cl < 0 {
            return Err(RepositoryError::InvalidInput(
                "threshold minimums must not be negative".to_string(),
            ));
        }

        let row: InventoryThresholdRow = sqlx::query_as(
            "INSERT INTO inventory_threshold (
                blend_batch_id, location, min_quantity_75cl, min_quantity_150cl, alert_enabled
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (blend_batch_id, location) DO UPDATE SET
                min_quantity_75cl = EXCLUDED.min_quantity_75cl,
                min_quantity_150cl = EXCLUDED.min_quantity_150cl,
                alert_enabled = EXCLUDED.alert_enabled,
                updated_at = NOW()
            RETURNING id, blend_batch_id, location, min_quantity_75cl, min_quantity_150cl,
                alert_enabled",
        )
        .bind(input.blend_batch_id.as_i32())
        .bind(&input.location)
        .bind(input.min_quantity_75cl)
        .bind(input.min_quantity_150cl)
        .bind(input.alert_enabled)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Delete a threshold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no threshold has this ID.
    pub async fn delete_threshold(&self, id: InventoryThresholdId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM inventory_threshold WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
