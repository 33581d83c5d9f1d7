//! Outgoing webhooks for stock alerts.
//!
//! Deliveries are signed with HMAC-SHA256 and retried with capped
//! exponential backoff. Queueing lives in [`crate::db::webhook`]; the loop
//! that drains the queue lives in [`crate::services::webhook_dispatch`].

pub mod client;
pub mod error;
pub mod payload;
pub mod retry;
pub mod signing;

pub use client::WebhookClient;
pub use error::WebhookError;
pub use payload::{LOW_STOCK_EVENT, LowStockPayload};
pub use retry::{DEFAULT_MAX_ATTEMPTS, RetryDecision, RetryPolicy};
pub use signing::{
    DELIVERY_HEADER, EVENT_HEADER, MAX_TIMESTAMP_SKEW_SECS, SIGNATURE_HEADER, TIMESTAMP_HEADER,
    sign, verify,
};
