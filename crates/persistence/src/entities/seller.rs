//! Seller profile entity (database row mapping).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the seller_profiles table.
#[derive(Debug, Clone, FromRow)]
pub struct SellerEntity {
    pub id: Uuid,
    pub business_name: Option<String>,
    pub commission_rate: Option<Decimal>,
    pub total_sales: Decimal,
    pub is_approved: bool,
    pub is_active: bool,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<SellerEntity> for domain::models::Seller {
    fn from(entity: SellerEntity) -> Self {
        Self {
            id: entity.id,
            business_name: entity.business_name,
            commission_rate: entity.commission_rate,
            total_sales: entity.total_sales,
            is_approved: entity.is_approved,
            is_active: entity.is_active,
            full_name: entity.full_name,
            email: entity.email,
            phone: entity.phone,
            created_at: entity.created_at,
        }
    }
}
