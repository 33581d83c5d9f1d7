//! The inventory core: pure computations over a snapshot of lots.
//!
//! Nothing here performs I/O or holds state. Callers load lots and
//! thresholds (see [`crate::db`]), call these functions, and decide what to
//! persist. Every function is safe to call concurrently on separate
//! snapshots.
//!
//! - [`allocate_fifo`] - plan a withdrawal, oldest stock first
//! - [`check_low_stock`] - raise alerts for pairs under threshold
//! - [`generate_lot_number`] - format a lot code
//! - [`plan_decrements`] / [`apply_decrements`] - turn a plan into lot changes

pub mod apply;
pub mod fifo;
pub mod lot_number;
pub mod low_stock;

pub use apply::{AllocationError, LotDecrement, apply_decrements, plan_decrements};
pub use fifo::{allocate_fifo, available_stock};
pub use lot_number::{generate_lot_number, with_sequence_suffix};
pub use low_stock::{
    CRITICAL_PERCENT, StockLevel, UNKNOWN_BLEND_NAME, check_low_stock, enabled_only,
    stock_levels, stock_percent,
};
