//! Database change feed for subscription rows.
//!
//! A trigger on `subscriptions` emits a JSON payload on the
//! [`SUBSCRIPTION_CHANNEL`] channel for every insert, update and delete. The
//! listener forwards each parsed change to the [`EarningsNotifier`].

use std::time::Duration;

use domain::services::{EarningsNotifier, SubscriptionChange};
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};

/// Postgres NOTIFY channel carrying subscription changes.
pub const SUBSCRIPTION_CHANNEL: &str = "subscription_changes";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Parse a notification payload. Malformed payloads yield `None`.
pub fn parse_change(payload: &str) -> Option<SubscriptionChange> {
    match serde_json::from_str(payload) {
        Ok(change) => Some(change),
        Err(e) => {
            warn!(error = %e, payload, "Dropping malformed subscription change");
            None
        }
    }
}

/// Forwards `LISTEN subscription_changes` notifications to the notifier.
pub struct ChangeFeedListener {
    pool: PgPool,
    notifier: EarningsNotifier,
}

impl ChangeFeedListener {
    pub fn new(pool: PgPool, notifier: EarningsNotifier) -> Self {
        Self { pool, notifier }
    }

    /// Listen until the process exits, reconnecting after connection loss.
    pub async fn run(self) {
        loop {
            if let Err(e) = self.listen().await {
                error!(error = %e, "Subscription change feed failed, reconnecting");
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn listen(&self) -> Result<(), sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(SUBSCRIPTION_CHANNEL).await?;
        info!(channel = SUBSCRIPTION_CHANNEL, "Listening for subscription changes");

        loop {
            let notification = listener.recv().await?;
            if let Some(change) = parse_change(notification.payload()) {
                let delivered = self.notifier.publish(change);
                debug!(delivered, "Subscription change published");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::ChangeOperation;

    #[test]
    fn test_parse_trigger_payload() {
        let payload = r#"{"operation":"INSERT","subscription_id":"9b2e4a52-7f1d-4a9e-8a43-3c1f0e3c2d11","device_id":"WM-1042","seller_id":"1f0e3c2d-7f1d-4a9e-8a43-9b2e4a523c11"}"#;
        let change = parse_change(payload).unwrap();
        assert_eq!(change.operation, ChangeOperation::Insert);
        assert_eq!(change.device_id.as_deref(), Some("WM-1042"));
        assert!(change.seller_id.is_some());
    }

    #[test]
    fn test_parse_delete_without_seller() {
        let payload = r#"{"operation":"DELETE","subscription_id":"9b2e4a52-7f1d-4a9e-8a43-3c1f0e3c2d11","device_id":null,"seller_id":null}"#;
        let change = parse_change(payload).unwrap();
        assert_eq!(change.operation, ChangeOperation::Delete);
        assert!(change.seller_id.is_none());
    }

    const CHANGE_FEED_SQL: &str =
        include_str!("migrations/20250101000004_subscription_change_feed.sql");

    #[test]
    fn test_change_feed_trigger_targets_gateway_owner() {
        assert!(CHANGE_FEED_SQL.contains(&format!("'{}'", SUBSCRIPTION_CHANNEL)));
        assert!(CHANGE_FEED_SQL.contains("JOIN gateways g ON g.id = d.gateway_id"));
        assert!(CHANGE_FEED_SQL.contains("COALESCE(owner_id, row_data.seller_id)"));
    }

    #[test]
    fn test_malformed_payload_is_dropped() {
        assert!(parse_change("not json").is_none());
        assert!(parse_change(r#"{"operation":"TRUNCATE"}"#).is_none());
    }
}
