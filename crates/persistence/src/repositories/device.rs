//! Device repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::DeviceEntity;
use crate::metrics::QueryTimer;

/// Repository for device lookups.
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    /// Creates a new DeviceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Devices attached to any of the given gateways.
    pub async fn find_by_gateways(
        &self,
        gateway_ids: &[Uuid],
    ) -> Result<Vec<DeviceEntity>, sqlx::Error> {
        if gateway_ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = QueryTimer::new("find_devices_by_gateways");
        let result = sqlx::query_as::<_, DeviceEntity>(
            r#"
            SELECT id, device_id, device_name, device_type, motor_status, error_status,
                   installation_date, last_updated, customer_name, customer_phone,
                   customer_email, gateway_id
            FROM devices
            WHERE gateway_id = ANY($1)
            ORDER BY device_id
            "#,
        )
        .bind(gateway_ids)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }
}
