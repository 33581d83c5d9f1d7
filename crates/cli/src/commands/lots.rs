//! Inventory lot commands.
//!
//! # Usage
//!
//! ```bash
//! # Record a bottling run (lot number generated from the blend name)
//! cellar-cli lots create --blend 1 --location cellar-a --date 2024-09-15 --qty-75cl 480
//!
//! # List lots with stock left at one location
//! cellar-cli lots list --location cellar-a --in-stock
//!
//! # Hold a lot back from allocation
//! cellar-cli lots status --lot 12 --status reserved
//!
//! # Show a lot's movements
//! cellar-cli lots history --lot 12
//! ```

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use tracing::info;

use cider_cellar::db::InventoryLotRepository;
use cider_cellar::models::{CreateLotInput, LotFilter};
use cider_cellar_core::{BlendBatchId, InventoryLotId, LotStatus};

use super::{connect, print_json};

/// `cellar-cli lots` subcommands.
#[derive(Debug, Subcommand)]
pub enum LotAction {
    /// Record a newly bottled lot
    Create(CreateLotArgs),
    /// List lots, oldest bottling first
    List(ListLotsArgs),
    /// Change a lot's status (active, reserved, depleted)
    Status {
        /// Lot to change
        #[arg(long)]
        lot: InventoryLotId,
        /// New status
        #[arg(long)]
        status: LotStatus,
    },
    /// Show a lot's movement history
    History {
        /// Lot to show
        #[arg(long)]
        lot: InventoryLotId,
    },
}

/// Arguments for `cellar-cli lots create`.
#[derive(Debug, Args)]
pub struct CreateLotArgs {
    /// Blend that was bottled
    #[arg(long)]
    pub blend: BlendBatchId,

    /// Storage location
    #[arg(long)]
    pub location: String,

    /// Bottling date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// 75cl bottles produced
    #[arg(long = "qty-75cl", default_value_t = 0)]
    pub qty_75cl: i32,

    /// 150cl bottles produced
    #[arg(long = "qty-150cl", default_value_t = 0)]
    pub qty_150cl: i32,

    /// Explicit lot number (generated when omitted)
    #[arg(long)]
    pub lot_number: Option<String>,

    /// Free-text notes
    #[arg(long)]
    pub notes: Option<String>,
}

/// Arguments for `cellar-cli lots list`.
#[derive(Debug, Args)]
pub struct ListLotsArgs {
    /// Only this blend
    #[arg(long)]
    pub blend: Option<BlendBatchId>,

    /// Only this location
    #[arg(long)]
    pub location: Option<String>,

    /// Only this status
    #[arg(long)]
    pub status: Option<LotStatus>,

    /// Only lots with bottles left
    #[arg(long)]
    pub in_stock: bool,

    /// Maximum lots to show
    #[arg(long, default_value_t = 100)]
    pub limit: i64,
}

/// Run a `lots` subcommand.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the operation fails.
pub async fn run(action: LotAction) -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = connect().await?;
    let repo = InventoryLotRepository::new(&pool);

    match action {
        LotAction::Create(args) => {
            let lot = repo
                .create_lot(&CreateLotInput {
                    blend_batch_id: args.blend,
                    lot_number: args.lot_number,
                    bottling_date: args.date,
                    location: args.location,
                    quantity_75cl: args.qty_75cl,
                    quantity_150cl: args.qty_150cl,
                    notes: args.notes,
                })
                .await?;
            info!(lot_id = %lot.id, lot_number = %lot.lot_number, "Recorded lot");
            print_json(&lot)?;
        }
        LotAction::List(args) => {
            let lots = repo
                .list_lots(&LotFilter {
                    blend_batch_id: args.blend,
                    location: args.location,
                    status: args.status,
                    has_remaining: args.in_stock.then_some(true),
                    limit: Some(args.limit),
                    offset: None,
                })
                .await?;
            print_json(&lots)?;
        }
        LotAction::Status { lot, status } => {
            repo.set_status(lot, status).await?;
            let updated = repo.get_lot(lot).await?.ok_or("lot disappeared")?;
            print_json(&updated)?;
        }
        LotAction::History { lot } => {
            let movements = repo.list_movements(lot).await?;
            print_json(&movements)?;
        }
    }

    Ok(())
}
