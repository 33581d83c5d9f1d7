//! Domain models for the cellar.
//!
//! - [`inventory_lot`] - lots, allocation requests and plans, movements
//! - [`threshold`] - low-stock policies and alerts
//! - [`webhook`] - outgoing alert deliveries

pub mod inventory_lot;
pub mod threshold;
pub mod webhook;

pub use inventory_lot::{
    AllocationRequest, AllocationResult, CreateLotInput, InventoryLot, InventoryMovement,
    LotAllocation, LotFilter, LotKey,
};
pub use threshold::{InventoryAlert, InventoryThreshold, UpsertThresholdInput};
pub use webhook::WebhookDelivery;
