//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! cellar-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CELLAR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations are embedded from `crates/cellar/migrations/`.

use tracing::info;

use cider_cellar::db;

use super::connect;

/// Run the cellar database migrations.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Connecting to cellar database...");
    let (_, pool) = connect().await?;

    info!("Running cellar migrations...");
    db::run_migrations(&pool).await?;

    info!("Cellar migrations complete!");
    Ok(())
}
