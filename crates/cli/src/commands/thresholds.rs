//! Low-stock threshold commands.
//!
//! # Usage
//!
//! ```bash
//! cellar-cli thresholds set --blend 1 --location cellar-a --min-75cl 120 --min-150cl 12
//! cellar-cli thresholds set --blend 1 --location cellar-a --min-75cl 120 --disabled
//! cellar-cli thresholds list
//! cellar-cli thresholds delete --id 3
//! ```

use clap::Subcommand;

use cider_cellar::db::ThresholdRepository;
use cider_cellar::models::UpsertThresholdInput;
use cider_cellar_core::{BlendBatchId, InventoryThresholdId};

use super::{connect, print_json};

/// `cellar-cli thresholds` subcommands.
#[derive(Debug, Subcommand)]
pub enum ThresholdAction {
    /// Create or replace the threshold for a blend at a location
    Set {
        /// Blend the threshold applies to
        #[arg(long)]
        blend: BlendBatchId,
        /// Location the threshold applies to
        #[arg(long)]
        location: String,
        /// Minimum 75cl bottles
        #[arg(long = "min-75cl", default_value_t = 0)]
        min_75cl: i32,
        /// Minimum 150cl bottles
        #[arg(long = "min-150cl", default_value_t = 0)]
        min_150cl: i32,
        /// Store the threshold with alerts switched off
        #[arg(long)]
        disabled: bool,
    },
    /// List every threshold
    List,
    /// Remove a threshold
    Delete {
        /// Threshold to remove
        #[arg(long)]
        id: InventoryThresholdId,
    },
}

/// Run a `thresholds` subcommand.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the operation fails.
pub async fn run(action: ThresholdAction) -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = connect().await?;
    let repo = ThresholdRepository::new(&pool);

    match action {
        ThresholdAction::Set {
            blend,
            location,
            min_75cl,
            min_150cl,
            disabled,
        } => {
            let threshold = repo
                .upsert_threshold(&UpsertThresholdInput {
                    blend_batch_id: blend,
                    location,
                    min_quantity_75cl: min_75cl,
                    min_quantity_150cl: min_150cl,
                    alert_enabled: !disabled,
                })
                .await?;
            print_json(&threshold)?;
        }
        ThresholdAction::List => print_json(&repo.list_thresholds().await?)?,
        ThresholdAction::Delete { id } => {
            repo.delete_threshold(id).await?;
            tracing::info!(threshold_id = %id, "Deleted threshold");
        }
    }

    Ok(())
}
