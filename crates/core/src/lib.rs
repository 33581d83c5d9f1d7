//! Cider Cellar Core - Shared types library.
//!
//! This crate provides common types used across all Cider Cellar components:
//! - `cellar` - Inventory allocation, low-stock detection, persistence and alert webhooks
//! - `cli` - Command-line tools for migrations and cellar operations
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
