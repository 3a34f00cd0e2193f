//! Seller profile repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::SellerEntity;
use crate::metrics::QueryTimer;

/// Repository for seller profile lookups.
#[derive(Clone)]
pub struct SellerRepository {
    pool: PgPool,
}

impl SellerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a seller profile by id.
    pub async fn find_by_id(&self, seller_id: Uuid) -> Result<Option<SellerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_seller");
        let result = sqlx::query_as::<_, SellerEntity>(
            r#"
            SELECT id, business_name, commission_rate, total_sales, is_approved,
                   is_active, full_name, email, phone, created_at
            FROM seller_profiles
            WHERE id = $1
            "#,
        )
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Ids of approved, active sellers.
    pub async fn find_approved_ids(&self) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("find_approved_seller_ids");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM seller_profiles
            WHERE is_approved = true AND is_active = true
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }
}
