//! Business logic services for the cellar.
//!
//! # Services
//!
//! - `allocation` - FIFO allocation committed with optimistic concurrency
//! - `stock_alerts` - Low-stock scans and alert queueing
//! - `webhook_dispatch` - Delivery of queued alert webhooks

pub mod allocation;
pub mod stock_alerts;
pub mod webhook_dispatch;

pub use allocation::{AllocationService, CommittedAllocation, ensure_complete, should_retry};
pub use stock_alerts::{StockAlertService, StockScan};
pub use webhook_dispatch::{
    DEFAULT_BATCH_SIZE, DispatchReport, FailureOutcome, WebhookDispatcher, failure_outcome,
};
