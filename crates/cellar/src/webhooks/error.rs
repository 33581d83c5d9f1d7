//! Webhook-related errors.

use thiserror::Error;

/// Errors that can occur when delivering or verifying webhooks.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// HTTP request failed before a response arrived.
    #[error("webhook request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status.
    #[error("webhook endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// Payload could not be serialized.
    #[error("webhook payload error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Signature missing, malformed, stale or wrong.
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// Client could not be configured.
    #[error("webhook configuration error: {0}")]
    Config(String),
}
