//! Gateway repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::GatewayEntity;
use crate::metrics::QueryTimer;

/// Repository for gateway lookups.
#[derive(Clone)]
pub struct GatewayRepository {
    pool: PgPool,
}

impl GatewayRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gateways owned by a seller.
    pub async fn find_by_seller(&self, seller_id: Uuid) -> Result<Vec<GatewayEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_gateways_by_seller");
        let result = sqlx::query_as::<_, GatewayEntity>(
            r#"
            SELECT id, name, status, latitude, longitude, max_devices, seller_id
            FROM gateways
            WHERE seller_id = $1
            ORDER BY name
            "#,
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }
}
