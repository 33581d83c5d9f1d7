//! FIFO allocation command.
//!
//! # Usage
//!
//! ```bash
//! # Preview against the database
//! cellar-cli allocate --blend 1 --location cellar-a --qty-75cl 24
//!
//! # Commit, failing if stock runs short
//! cellar-cli allocate --blend 1 --location cellar-a --qty-75cl 24 --apply --require-full
//!
//! # Work on a snapshot file instead (rewritten in place with --apply)
//! cellar-cli allocate --snapshot stock.yaml --blend 1 --location cellar-a --qty-150cl 6 --apply
//! ```

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::info;

use cider_cellar::inventory::{LotDecrement, allocate_fifo, apply_decrements, plan_decrements};
use cider_cellar::models::{AllocationRequest, AllocationResult};
use cider_cellar::services::{AllocationService, ensure_complete};
use cider_cellar_core::BlendBatchId;

use super::{connect, print_json};
use super::snapshot::Snapshot;

/// Arguments for `cellar-cli allocate`.
#[derive(Debug, Args)]
pub struct AllocateArgs {
    /// Blend batch to draw from
    #[arg(long)]
    pub blend: BlendBatchId,

    /// Location to draw from
    #[arg(long)]
    pub location: String,

    /// 75cl bottles wanted
    #[arg(long = "qty-75cl")]
    pub qty_75cl: Option<i32>,

    /// 150cl bottles wanted
    #[arg(long = "qty-150cl")]
    pub qty_150cl: Option<i32>,

    /// Read lots from a YAML/JSON snapshot instead of the database
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Persist the allocation (database write, or snapshot rewrite)
    #[arg(long)]
    pub apply: bool,

    /// Fail without writing if the request cannot be fully met
    #[arg(long)]
    pub require_full: bool,

    /// Reference recorded on movement rows (order number, event, ...)
    #[arg(long)]
    pub reference: Option<String>,
}

impl AllocateArgs {
    fn request(&self) -> AllocationRequest {
        AllocationRequest {
            blend_batch_id: self.blend,
            location: self.location.clone(),
            quantity_75cl: self.qty_75cl,
            quantity_150cl: self.qty_150cl,
        }
    }
}

/// Output of an offline allocation.
#[derive(Debug, Serialize)]
struct SnapshotAllocation {
    result: AllocationResult,
    applied: bool,
    decrements: Vec<LotDecrement>,
}

/// Run the allocate command.
///
/// # Errors
///
/// Returns an error if the lots cannot be loaded, a full allocation was
/// required but stock ran short, or the write fails.
pub async fn run(args: AllocateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request = args.request();

    if let Some(path) = &args.snapshot {
        let mut snapshot = Snapshot::load(path).await?;
        let result = allocate_fifo(&snapshot.lots, &request);
        ensure_complete(&result, args.require_full)?;

        let decrements = if args.apply {
            let decrements = plan_decrements(&snapshot.lots, &result)?;
            apply_decrements(&mut snapshot.lots, &decrements)?;
            snapshot.save(path).await?;
            info!(path = %path.display(), lots = decrements.len(), "Snapshot updated");
            decrements
        } else {
            Vec::new()
        };

        print_json(&SnapshotAllocation {
            result,
            applied: args.apply,
            decrements,
        })?;
        return Ok(());
    }

    let (config, pool) = connect().await?;
    let service = AllocationService::new(pool, config.allocation_max_retries);

    if args.apply {
        let committed = service
            .allocate_and_commit(&request, args.require_full, args.reference.as_deref())
            .await?;
        print_json(&committed)?;
    } else {
        let result = service.preview(&request).await?;
        ensure_complete(&result, args.require_full)?;
        print_json(&result)?;
    }

    Ok(())
}
