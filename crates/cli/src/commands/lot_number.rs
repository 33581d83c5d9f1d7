//! Lot number command.

use chrono::{NaiveDate, Utc};
use clap::Args;

use cider_cellar::inventory::generate_lot_number;

/// Arguments for `cellar-cli lot-number`.
#[derive(Debug, Args)]
pub struct LotNumberArgs {
    /// Blend name, e.g. "Autumn Harvest"
    #[arg(long)]
    pub blend_name: String,

    /// Bottling date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Print the lot number for a blend bottled on a date.
pub fn run(args: &LotNumberArgs) {
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let lot_number = generate_lot_number(&args.blend_name, date);

    #[allow(clippy::print_stdout)]
    {
        println!("{lot_number}");
    }
}
