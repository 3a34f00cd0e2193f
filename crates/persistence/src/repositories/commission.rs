//! Global commission rate repository.

use sqlx::PgPool;

use crate::entities::CommissionRateEntity;
use crate::metrics::QueryTimer;

/// Repository for the configured commission rates.
#[derive(Clone)]
pub struct CommissionRepository {
    pool: PgPool,
}

impl CommissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The most recently created active rate.
    pub async fn find_active(&self) -> Result<Option<CommissionRateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_commission_rate");
        let result = sqlx::query_as::<_, CommissionRateEntity>(
            r#"
            SELECT id, rate, is_active, created_at
            FROM commissions
            WHERE is_active = true
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }
}
