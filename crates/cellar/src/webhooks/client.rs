//! HTTP client for signed webhook deliveries.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use secrecy::SecretString;
use tracing::{debug, instrument, warn};
use url::Url;

use cider_cellar_core::WebhookDeliveryId;

use super::error::WebhookError;
use super::signing::{DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER, sign};

/// Longest response body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client that posts signed JSON bodies to one endpoint.
#[derive(Clone)]
pub struct WebhookClient {
    /// HTTP client.
    client: Client,
    /// Endpoint receiving deliveries.
    endpoint: Url,
    /// Signing secret shared with the endpoint.
    secret: SecretString,
}

impl std::fmt::Debug for WebhookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl WebhookClient {
    /// Create a client for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Config` if the HTTP client cannot be built.
    pub fn new(endpoint: Url, secret: SecretString, timeout: Duration) -> Result<Self, WebhookError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WebhookError::Config(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            secret,
        })
    }

    /// Endpoint receiving deliveries.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post one delivery.
    ///
    /// The body is signed with the current time. Any 2xx response counts as
    /// delivered.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Request` on transport failure and
    /// `WebhookError::Status` on a non-2xx response.
    #[instrument(skip(self, payload), fields(endpoint = %self.endpoint))]
    pub async fn send(
        &self,
        delivery_id: WebhookDeliveryId,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<(), WebhookError> {
        let body = serde_json::to_string(payload)?;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = sign(&self.secret, timestamp, &body)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(EVENT_HEADER, event_type)
            .header(DELIVERY_HEADER, delivery_id.to_string())
            .body(body)
            .send()
            .await
            .map_err(|e| WebhookError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            warn!(status = status.as_u16(), "Webhook endpoint rejected delivery");
            return Err(WebhookError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Webhook delivered");
        Ok(())
    }
}
