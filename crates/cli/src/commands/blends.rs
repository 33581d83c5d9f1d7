//! Blend commands.
//!
//! # Usage
//!
//! ```bash
//! cellar-cli blends create --name "Autumn Harvest"
//! cellar-cli blends list
//! ```

use std::collections::BTreeMap;

use cider_cellar::db::BlendRepository;

use super::{connect, print_json};

/// Register a blend and print its ID.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub async fn create(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = connect().await?;
    let id = BlendRepository::new(&pool).create(name).await?;
    tracing::info!(blend_batch_id = %id, name, "Created blend");
    print_json(&serde_json::json!({ "id": id, "name": name }))?;
    Ok(())
}

/// Print every blend, ordered by ID.
///
/// # Errors
///
/// Returns an error if the database read fails.
pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = connect().await?;
    let names: BTreeMap<_, _> = BlendRepository::new(&pool).names().await?.into_iter().collect();
    print_json(&names)?;
    Ok(())
}
