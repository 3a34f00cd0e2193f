//! Subscription entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::PaymentStatus;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the subscriptions table.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub device_id: String,
    pub amount: Decimal,
    pub commission_amount: Option<Decimal>,
    pub payment_status: String,
    pub plan_name: Option<String>,
    pub plan_type: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub seller_id: Option<Uuid>,
}

impl From<SubscriptionEntity> for domain::models::Subscription {
    fn from(entity: SubscriptionEntity) -> Self {
        Self {
            id: entity.id,
            device_id: entity.device_id,
            amount: entity.amount,
            commission_amount: entity.commission_amount,
            payment_status: PaymentStatus::from_db(&entity.payment_status),
            plan_name: entity.plan_name,
            plan_type: entity.plan_type,
            valid_from: entity.valid_from,
            valid_until: entity.valid_until,
            seller_id: entity.seller_id,
        }
    }
}
