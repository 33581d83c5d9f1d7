//! Cider Cellar CLI - migrations, allocation and stock alert tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! cellar-cli migrate
//!
//! # Register a blend and record a bottling run
//! cellar-cli blends create --name "Autumn Harvest"
//! cellar-cli lots create --blend 1 --location cellar-a --date 2024-09-15 --qty-75cl 480
//!
//! # Set the restock threshold for a blend at a location
//! cellar-cli thresholds set --blend 1 --location cellar-a --min-75cl 120 --min-150cl 12
//!
//! # Allocate 24 x 75cl oldest-first and commit
//! cellar-cli allocate --blend 1 --location cellar-a --qty-75cl 24 --apply
//!
//! # Check stock against thresholds
//! cellar-cli low-stock --enabled-only --notify
//!
//! # Lot number for a bottling run
//! cellar-cli lot-number --blend-name "Autumn Harvest" --date 2024-09-15
//!
//! # Send queued alert webhooks
//! cellar-cli webhooks deliver
//! ```
//!
//! # Logging
//!
//! `RUST_LOG` filters events (default `cider_cellar=info,cellar_cli=info`).
//! `LOG_FORMAT=json` switches to JSON lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cider_cellar::services::DEFAULT_BATCH_SIZE;

mod commands;

use commands::allocate::AllocateArgs;
use commands::lot_number::LotNumberArgs;
use commands::lots::LotAction;
use commands::low_stock::LowStockArgs;
use commands::thresholds::ThresholdAction;

#[derive(Parser)]
#[command(name = "cellar-cli")]
#[command(author, version, about = "Cider Cellar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage blends
    Blends {
        #[command(subcommand)]
        action: BlendAction,
    },
    /// Manage inventory lots
    Lots {
        #[command(subcommand)]
        action: LotAction,
    },
    /// Manage low-stock thresholds
    Thresholds {
        #[command(subcommand)]
        action: ThresholdAction,
    },
    /// Allocate stock oldest-first
    Allocate(AllocateArgs),
    /// Report (blend, location) pairs under their thresholds
    LowStock(LowStockArgs),
    /// Print the lot number for a bottling run
    LotNumber(LotNumberArgs),
    /// Manage the alert webhook queue
    Webhooks {
        #[command(subcommand)]
        action: WebhookAction,
    },
}

#[derive(Subcommand)]
enum BlendAction {
    /// Register a blend
    Create {
        /// Blend name, used to derive lot numbers
        #[arg(long)]
        name: String,
    },
    /// List registered blends
    List,
}

#[derive(Subcommand)]
enum WebhookAction {
    /// Send every delivery that is due
    Deliver {
        /// Maximum deliveries to attempt
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing, honouring `RUST_LOG` and `LOG_FORMAT`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cider_cellar=info,cellar_cli=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Blends { action } => match action {
            BlendAction::Create { name } => commands::blends::create(&name).await?,
            BlendAction::List => commands::blends::list().await?,
        },
        Commands::Lots { action } => commands::lots::run(action).await?,
        Commands::Thresholds { action } => commands::thresholds::run(action).await?,
        Commands::Allocate(args) => commands::allocate::run(args).await?,
        Commands::LowStock(args) => commands::low_stock::run(args).await?,
        Commands::LotNumber(args) => commands::lot_number::run(&args),
        Commands::Webhooks { action } => match action {
            WebhookAction::Deliver { limit } => commands::webhooks::deliver(limit).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_allocate() {
        let cli = Cli::try_parse_from([
            "cellar-cli",
            "allocate",
            "--blend",
            "3",
            "--location",
            "cellar-a",
            "--qty-75cl",
            "24",
            "--apply",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Allocate(AllocateArgs { apply: true, qty_75cl: Some(24), qty_150cl: None, .. }))
        ));
    }

    #[test]
    fn test_low_stock_snapshot_conflicts_with_notify() {
        let cli = Cli::try_parse_from([
            "cellar-cli",
            "low-stock",
            "--snapshot",
            "stock.yaml",
            "--notify",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_parse_lot_status() {
        let cli = Cli::try_parse_from([
            "cellar-cli", "lots", "status", "--lot", "12", "--status", "reserved",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Lots {
                action: LotAction::Status { status: cider_cellar_core::LotStatus::Reserved, .. }
            })
        ));

        let cli = Cli::try_parse_from([
            "cellar-cli", "lots", "status", "--lot", "12", "--status", "sold",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_parse_threshold_set_disabled() {
        let cli = Cli::try_parse_from([
            "cellar-cli",
            "thresholds",
            "set",
            "--blend",
            "1",
            "--location",
            "cellar-a",
            "--min-75cl",
            "120",
            "--disabled",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Thresholds {
                action: ThresholdAction::Set { min_75cl: 120, min_150cl: 0, disabled: true, .. }
            })
        ));
    }

    #[test]
    fn test_parse_webhooks_deliver_default_limit() {
        let cli = Cli::try_parse_from(["cellar-cli", "webhooks", "deliver"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Webhooks {
                action: WebhookAction::Deliver { limit: DEFAULT_BATCH_SIZE }
            })
        ));
    }
}
