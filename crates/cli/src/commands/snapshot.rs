//! Offline inventory snapshots.
//!
//! A snapshot file holds lots, thresholds and blend names as YAML or JSON,
//! chosen by file extension (`.json` is JSON, anything else YAML). It lets
//! `allocate` and `low-stock` run without a database.
//!
//! ```yaml
//! blend_names:
//!   1: Autumn Harvest
//! lots:
//!   - id: 10
//!     blend_batch_id: 1
//!     lot_number: AH-240915
//!     bottling_date: 2024-09-15
//!     location: cellar-a
//!     initial_quantity_75cl: 120
//!     initial_quantity_150cl: 24
//!     current_quantity_75cl: 80
//!     current_quantity_150cl: 24
//!     version: 0
//! thresholds:
//!   - id: 1
//!     blend_batch_id: 1
//!     location: cellar-a
//!     min_quantity_75cl: 100
//!     min_quantity_150cl: 12
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cider_cellar::models::{InventoryLot, InventoryThreshold};
use cider_cellar_core::BlendBatchId;

/// Errors reading or writing a snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to access snapshot {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid YAML snapshot: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid JSON snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Inventory state as plain data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Blend ID to display name.
    #[serde(default)]
    pub blend_names: HashMap<BlendBatchId, String>,
    /// Lots in any status.
    #[serde(default)]
    pub lots: Vec<InventoryLot>,
    /// Low-stock thresholds.
    #[serde(default)]
    pub thresholds: Vec<InventoryThreshold>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

impl Snapshot {
    /// Parse snapshot text in the format implied by `path`.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the text does not parse.
    pub fn parse(path: &Path, content: &str) -> Result<Self, SnapshotError> {
        Ok(match Format::of(path) {
            Format::Json => serde_json::from_str(content)?,
            Format::Yaml => serde_yaml::from_str(content)?,
        })
    }

    /// Render the snapshot in the format implied by `path`.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if serialization fails.
    pub fn render(&self, path: &Path) -> Result<String, SnapshotError> {
        Ok(match Format::of(path) {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?,
        })
    }

    /// Read a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SnapshotError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::parse(path, &content)
    }

    /// Write the snapshot back to `path`.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let content = self.render(path)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| SnapshotError::Io {
                path: path.display().to_string(),
                source,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use cider_cellar_core::LotStatus;

    use super::*;

    const YAML: &str = "
blend_names:
  1: Autumn Harvest
lots:
  - id: 10
    blend_batch_id: 1
    lot_number: AH-240915
    bottling_date: 2024-09-15
    location: cellar-a
    initial_quantity_75cl: 120
    initial_quantity_150cl: 24
    current_quantity_75cl: 80
    current_quantity_150cl: 24
    version: 0
thresholds:
  - id: 1
    blend_batch_id: 1
    location: cellar-a
    min_quantity_75cl: 100
    min_quantity_150cl: 12
";

    #[test]
    fn test_parse_yaml_snapshot() {
        let snapshot = Snapshot::parse(Path::new("stock.yaml"), YAML).unwrap();

        assert_eq!(
            snapshot.blend_names.get(&BlendBatchId::new(1)).map(String::as_str),
            Some("Autumn Harvest")
        );
        assert_eq!(snapshot.lots.len(), 1);
        assert_eq!(snapshot.lots[0].status, LotStatus::Active);
        assert_eq!(snapshot.lots[0].current_quantity_75cl, 80);
        assert!(snapshot.thresholds[0].alert_enabled);
    }

    #[test]
    fn test_json_snapshot_survives_rewrite() {
        let yaml = Snapshot::parse(Path::new("stock.yml"), YAML).unwrap();
        let path = Path::new("stock.JSON");

        let rendered = yaml.render(path).unwrap();
        assert!(rendered.trim_start().starts_with('{'));
        assert_eq!(Snapshot::parse(path, &rendered).unwrap(), yaml);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::parse(Path::new("empty.json"), "{}").unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn test_invalid_snapshot() {
        let err = Snapshot::parse(Path::new("broken.yaml"), "lots: 12").unwrap_err();
        assert!(matches!(err, SnapshotError::Yaml(_)));
    }
}
