//! Low-stock check command.
//!
//! # Usage
//!
//! ```bash
//! # Scan the database and queue a webhook if anything is low
//! cellar-cli low-stock --notify
//!
//! # Scan a snapshot, ignoring thresholds with alerts switched off
//! cellar-cli low-stock --snapshot stock.yaml --enabled-only
//! ```

use std::path::PathBuf;

use clap::Args;

use cider_cellar::inventory::{check_low_stock, enabled_only};
use cider_cellar::services::StockAlertService;

use super::{connect, print_json};
use super::snapshot::Snapshot;

/// Arguments for `cellar-cli low-stock`.
#[derive(Debug, Args)]
pub struct LowStockArgs {
    /// Read lots and thresholds from a YAML/JSON snapshot instead of the database
    #[arg(long, conflicts_with = "notify")]
    pub snapshot: Option<PathBuf>,

    /// Skip thresholds whose alerts are switched off
    #[arg(long)]
    pub enabled_only: bool,

    /// Queue an `inventory.low_stock` webhook when alerts fire
    #[arg(long)]
    pub notify: bool,
}

/// Run the low-stock command.
///
/// # Errors
///
/// Returns an error if the inventory cannot be loaded or the webhook cannot
/// be queued.
pub async fn run(args: LowStockArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &args.snapshot {
        let snapshot = Snapshot::load(path).await?;
        let thresholds = if args.enabled_only {
            enabled_only(&snapshot.thresholds)
        } else {
            snapshot.thresholds
        };
        let alerts = check_low_stock(&snapshot.lots, &thresholds, &snapshot.blend_names);
        print_json(&alerts)?;
        return Ok(());
    }

    let (_, pool) = connect().await?;
    let scan = StockAlertService::new(pool)
        .scan(args.enabled_only, args.notify)
        .await?;
    print_json(&scan)?;

    Ok(())
}
