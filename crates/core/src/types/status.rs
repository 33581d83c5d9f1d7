//! Status enums for cellar entities.
//!
//! All enums use `snake_case` wire names, both in JSON and in the
//! `PostgreSQL` enum types created by the cellar migrations.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an inventory lot.
///
/// Lots start `Active` on bottling. They become `Depleted` once both bottle
/// sizes reach zero, or `Reserved` under external business rules. Only
/// `Active` lots are eligible for allocation or count toward stock levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "lot_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
    #[default]
    Active,
    Depleted,
    Reserved,
}

impl std::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Depleted => write!(f, "depleted"),
            Self::Reserved => write!(f, "reserved"),
        }
    }
}

impl std::str::FromStr for LotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "depleted" => Ok(Self::Depleted),
            "reserved" => Ok(Self::Reserved),
            _ => Err(format!("invalid lot status: {s}")),
        }
    }
}

/// Severity of a low-stock alert.
///
/// Variants are declared critical-first, so sorting by severity places
/// `Critical` alerts ahead of `Low` ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Less than 25% of the threshold remains in at least one bottle size.
    Critical,
    /// Below threshold, but at least 25% remains in every bottle size.
    Low,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Self::Critical),
            "low" => Ok(Self::Low),
            _ => Err(format!("invalid alert severity: {s}")),
        }
    }
}

/// Delivery status of an outgoing webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "delivery_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Waiting for its first or next attempt.
    #[default]
    Pending,
    /// The endpoint acknowledged the delivery with a 2xx response.
    Delivered,
    /// All attempts were exhausted.
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Delivered => write!(f, "delivered"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "delivered" => Ok(Self::Delivered),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid delivery status: {s}")),
        }
    }
}

/// Reason a lot's quantities changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "movement_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Stock drawn by a FIFO allocation (shipment, sale).
    Allocation,
    /// Manual stock correction.
    Adjustment,
    /// Stock written off (breakage, spoilage).
    WriteOff,
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allocation => write!(f, "allocation"),
            Self::Adjustment => write!(f, "adjustment"),
            Self::WriteOff => write!(f, "write_off"),
        }
    }
}

impl std::str::FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allocation" => Ok(Self::Allocation),
            "adjustment" => Ok(Self::Adjustment),
            "write_off" => Ok(Self::WriteOff),
            _ => Err(format!("invalid movement type: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lot_status_roundtrip() {
        for status in [LotStatus::Active, LotStatus::Depleted, LotStatus::Reserved] {
            let parsed: LotStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("archived".parse::<LotStatus>().is_err());
    }

    #[test]
    fn test_lot_status_default_is_active() {
        assert_eq!(LotStatus::default(), LotStatus::Active);
    }

    #[test]
    fn test_severity_orders_critical_first() {
        let mut severities = vec![AlertSeverity::Low, AlertSeverity::Critical, AlertSeverity::Low];
        severities.sort();
        assert_eq!(
            severities,
            vec![AlertSeverity::Critical, AlertSeverity::Low, AlertSeverity::Low]
        );
    }

    #[test]
    fn test_serde_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&MovementType::WriteOff).unwrap(),
            "\"write_off\""
        );
        assert_eq!(
            serde_json::to_string(&AlertSeverity::Critical).unwrap(),
            "\"critical\""
        );
        let status: DeliveryStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(status, DeliveryStatus::Delivered);
    }

    #[test]
    fn test_movement_type_from_str() {
        assert_eq!(
            "write_off".parse::<MovementType>().unwrap(),
            MovementType::WriteOff
        );
        assert!("WRITE_OFF".parse::<MovementType>().is_err());
    }
}
