//! Cider cellar inventory library.
//!
//! Bottled lots are drawn down oldest-first, stock is checked against
//! per-(blend, location) thresholds, and low-stock alerts can be forwarded
//! to a signed webhook.
//!
//! The [`inventory`] module is pure and works on in-memory snapshots. The
//! [`db`] and [`services`] modules persist the same operations to
//! `PostgreSQL`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod models;
pub mod services;
pub mod webhooks;

pub use config::{CellarConfig, ConfigError, WebhookConfig};
pub use error::AppError;
