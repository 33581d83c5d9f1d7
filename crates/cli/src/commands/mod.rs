//! CLI subcommand implementations.

pub mod allocate;
pub mod blends;
pub mod lots;
pub mod low_stock;
pub mod lot_number;
pub mod migrate;
pub mod snapshot;
pub mod thresholds;
pub mod webhooks;

use serde::Serialize;
use sqlx::PgPool;

use cider_cellar::{CellarConfig, db};

/// Load configuration and connect to the cellar database.
///
/// # Errors
///
/// Returns an error if configuration is missing or the database is
/// unreachable.
pub async fn connect() -> Result<(CellarConfig, PgPool), Box<dyn std::error::Error>> {
    let config = CellarConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    Ok((config, pool))
}

/// Print a value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns `serde_json::Error` if the value cannot be serialized.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let output = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
    Ok(())
}
