//! Seller domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A seller who owns gateways and earns commission on recharges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: Uuid,
    pub business_name: Option<String>,
    /// Commission percentage. `None` falls back to the global rate.
    pub commission_rate: Option<Decimal>,
    pub total_sales: Decimal,
    pub is_approved: bool,
    pub is_active: bool,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Seller {
    /// Business name or `N/A` for reports.
    pub fn business_name_or_default(&self) -> &str {
        self.business_name.as_deref().unwrap_or("N/A")
    }
}
