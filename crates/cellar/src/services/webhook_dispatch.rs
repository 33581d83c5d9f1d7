//! Draining the webhook queue.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::db::WebhookDeliveryRepository;
use crate::error::AppError;
use crate::models::WebhookDelivery;
use crate::webhooks::{RetryDecision, RetryPolicy, WebhookClient};

/// Deliveries picked up per run.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Counts from one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Deliveries accepted by the endpoint.
    pub delivered: usize,
    /// Failed attempts that will be retried.
    pub rescheduled: usize,
    /// Deliveries abandoned after their last attempt.
    pub failed: usize,
}

/// What to record after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Try again at this time.
    Reschedule(DateTime<Utc>),
    /// Give up and mark the delivery failed.
    Fail,
}

/// Sends due deliveries and records the result of each attempt.
pub struct WebhookDispatcher {
    pool: PgPool,
    client: WebhookClient,
    policy: RetryPolicy,
}

impl WebhookDispatcher {
    /// Create a new dispatcher.
    #[must_use]
    pub const fn new(pool: PgPool, client: WebhookClient, policy: RetryPolicy) -> Self {
        Self {
            pool,
            client,
            policy,
        }
    }

    /// Attempt every pending delivery that is due.
    ///
    /// Send failures are recorded on the delivery, not returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the queue cannot be read or updated.
    #[instrument(skip(self), fields(endpoint = %self.client.endpoint()))]
    pub async fn deliver_due(&self, limit: i64) -> Result<DispatchReport, AppError> {
        let repo = WebhookDeliveryRepository::new(&self.pool);
        let due = repo.list_due(Utc::now(), limit).await?;
        let mut report = DispatchReport::default();

        for delivery in due {
            let attempts = delivery.attempts.saturating_add(1);

            match self
                .client
                .send(delivery.id, &delivery.event_type, &delivery.payload)
                .await
            {
                Ok(()) => {
                    repo.mark_delivered(delivery.id, attempts).await?;
                    report.delivered += 1;
                }
                Err(e) => {
                    let error = e.to_string();
                    match failure_outcome(&self.policy, &delivery, Utc::now()) {
                        FailureOutcome::Reschedule(next_attempt_at) => {
                            warn!(
                                delivery_id = %delivery.id,
                                attempts,
                                %next_attempt_at,
                                error = %error,
                                "Webhook delivery failed, will retry"
                            );
                            repo.reschedule(delivery.id, attempts, &error, next_attempt_at)
                                .await?;
                            report.rescheduled += 1;
                        }
                        FailureOutcome::Fail => {
                            warn!(
                                delivery_id = %delivery.id,
                                attempts,
                                error = %error,
                                "Webhook delivery abandoned"
                            );
                            repo.mark_failed(delivery.id, attempts, &error).await?;
                            report.failed += 1;
                        }
                    }
                }
            }
        }

        info!(
            delivered = report.delivered,
            rescheduled = report.rescheduled,
            failed = report.failed,
            "Webhook dispatch complete"
        );
        Ok(report)
    }
}

/// Decide how to record a failed attempt on `delivery` made at `now`.
///
/// `delivery.attempts` is the count before this attempt.
#[must_use]
pub fn failure_outcome(
    policy: &RetryPolicy,
    delivery: &WebhookDelivery,
    now: DateTime<Utc>,
) -> FailureOutcome {
    let attempts = u32::try_from(delivery.attempts.saturating_add(1)).unwrap_or(u32::MAX);
    match policy.after_failure(attempts) {
        RetryDecision::RetryAfter(delay) => chrono::Duration::from_std(delay)
            .map_or(FailureOutcome::Fail, |delay| {
                FailureOutcome::Reschedule(now + delay)
            }),
        RetryDecision::GiveUp => FailureOutcome::Fail,
    }
}
