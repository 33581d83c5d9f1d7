//! Unified error handling for the cellar.

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::inventory::AllocationError;
use crate::webhooks::WebhookError;

/// Application-level error type for cellar services.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Allocation plan could not be applied.
    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    /// Webhook delivery failed.
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Whether restarting the same operation from a fresh read may succeed.
    ///
    /// Optimistic concurrency conflicts and dropped connections are
    /// transient. Rejected input, missing rows and failed queries are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Database(
                RepositoryError::Conflict(_)
                    | RepositoryError::Database(sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
            ) | Self::Allocation(AllocationError::VersionConflict { .. })
                | Self::Webhook(WebhookError::Request(_))
        )
    }
}
