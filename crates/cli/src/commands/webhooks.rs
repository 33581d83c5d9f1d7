//! Webhook queue commands.
//!
//! # Usage
//!
//! ```bash
//! cellar-cli webhooks deliver --limit 20
//! ```
//!
//! # Environment Variables
//!
//! - `CELLAR_WEBHOOK_URL` / `CELLAR_WEBHOOK_SECRET` - required
//! - `CELLAR_WEBHOOK_MAX_ATTEMPTS` - attempts before a delivery is failed

use cider_cellar::services::WebhookDispatcher;
use cider_cellar::webhooks::{RetryPolicy, WebhookClient};

use super::{connect, print_json};

/// Send every due delivery once.
///
/// # Errors
///
/// Returns an error if webhooks are not configured or the queue cannot be
/// read. Failed sends are recorded on the delivery instead.
pub async fn deliver(limit: i64) -> Result<(), Box<dyn std::error::Error>> {
    let (config, pool) = connect().await?;
    let webhook = config
        .webhook()
        .ok_or("CELLAR_WEBHOOK_URL and CELLAR_WEBHOOK_SECRET must be set")?;

    let client = WebhookClient::new(webhook.url.clone(), webhook.secret.clone(), webhook.timeout)?;
    let policy = RetryPolicy::with_max_attempts(webhook.max_attempts);

    let report = WebhookDispatcher::new(pool, client, policy)
        .deliver_due(limit)
        .await?;
    print_json(&report)?;

    Ok(())
}
