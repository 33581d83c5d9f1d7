//! Database operations for the cellar `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `blend_batch` - Blends that lots are bottled from
//! - `inventory_lot` - Bottled lots with live quantities and a row `version`
//! - `inventory_movement` - Quantity history per lot
//! - `inventory_threshold` - Minimum stock per (blend, location)
//! - `webhook_delivery` - Outgoing alert queue
//!
//! # Migrations
//!
//! Migrations are stored in `crates/cellar/migrations/` and run via:
//! ```bash
//! cargo run -p cider-cellar-cli -- migrate
//! ```

pub mod blend;
pub mod inventory_lot;
pub mod threshold;
pub mod webhook;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use blend::BlendRepository;
pub use inventory_lot::InventoryLotRepository;
pub use threshold::ThresholdRepository;
pub use webhook::WebhookDeliveryRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Optimistic concurrency check failed or a unique key is taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Input rejected before reaching the database.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Whether `err` is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lot_numbers_are_unique_in_schema() {
        assert!(
            MIGRATOR
                .iter()
                .any(|migration| migration.sql.contains("UNIQUE (lot_number)"))
        );
    }

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }
}
