//! Database lookups for blend batches.

use std::collections::HashMap;

use sqlx::PgPool;

use cider_cellar_core::BlendBatchId;

use super::RepositoryError;

/// Repository for blend batch lookups.
pub struct BlendRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlendRepository<'a> {
    /// Create a new blend repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a blend and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, name: &str) -> Result<BlendBatchId, RepositoryError> {
        let id: i32 = sqlx::query_scalar("INSERT INTO blend_batch (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(self.pool)
            .await?;

        Ok(BlendBatchId::new(id))
    }

    /// Get the name of a blend.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn name(&self, id: BlendBatchId) -> Result<Option<String>, RepositoryError> {
        let name = sqlx::query_scalar("SELECT name FROM blend_batch WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        Ok(name)
    }

    /// Map every blend ID to its name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn names(&self) -> Result<HashMap<BlendBatchId, String>, RepositoryError> {
        let rows: Vec<(i32, String)> = sqlx::query_as("SELECT id, name FROM blend_batch")
            .fetch_all(self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| (BlendBatchId::new(id), name))
            .collect())
    }
}
