//! Commission rate entity (database row mapping).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the commissions table.
#[derive(Debug, Clone, FromRow)]
pub struct CommissionRateEntity {
    pub id: Uuid,
    pub rate: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
