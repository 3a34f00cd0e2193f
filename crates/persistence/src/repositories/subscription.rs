//! Subscription repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::SubscriptionEntity;
use crate::metrics::QueryTimer;

/// Repository for subscription (recharge) lookups.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Completed subscriptions for the devices with `valid_from` in `[start, end)`,
    /// newest first.
    pub async fn find_completed_in_window(
        &self,
        device_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionEntity>, sqlx::Error> {
        if device_ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = QueryTimer::new("find_completed_subscriptions");
        let result = sqlx::query_as::<_, SubscriptionEntity>(
            r#"
            SELECT id, device_id, amount, commission_amount, payment_status,
                   plan_name, plan_type, valid_from, valid_until, seller_id
            FROM subscriptions
            WHERE device_id = ANY($1)
              AND payment_status = 'completed'
              AND valid_from >= $2
              AND valid_from < $3
            ORDER BY valid_from DESC
            "#,
        )
        .bind(device_ids)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }
}
