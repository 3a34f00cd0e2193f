//! Subscription (recharge) domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment state of a recharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Maps a stored status string; unrecognised values become `Unknown`.
    pub fn from_db(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "completed" => PaymentStatus::Completed,
            "pending" => PaymentStatus::Pending,
            "failed" => PaymentStatus::Failed,
            _ => PaymentStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Unknown => "unknown",
        }
    }

    /// Label shown in transaction lists.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "Completed",
            _ => "Pending",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prepaid recharge of a device for a validity period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    /// External device identifier.
    pub device_id: String,
    pub amount: Decimal,
    pub commission_amount: Option<Decimal>,
    pub payment_status: PaymentStatus,
    pub plan_name: Option<String>,
    pub plan_type: Option<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    /// Denormalized seller reference; the topology is authoritative.
    pub seller_id: Option<Uuid>,
}

impl Subscription {
    pub fn is_completed(&self) -> bool {
        self.payment_status == PaymentStatus::Completed
    }

    pub fn has_valid_range(&self) -> bool {
        self.valid_from <= self.valid_until
    }

    pub fn plan_name_or_default(&self) -> &str {
        self.plan_name.as_deref().unwrap_or("Unknown Plan")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_from_db() {
        assert_eq!(PaymentStatus::from_db("completed"), PaymentStatus::Completed);
        assert_eq!(PaymentStatus::from_db("Pending"), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_db("refunded"), PaymentStatus::Unknown);
    }

    #[test]
    fn test_payment_status_deserialize_unknown() {
        let status: PaymentStatus = serde_json::from_str("\"chargeback\"").unwrap();
        assert_eq!(status, PaymentStatus::Unknown);
    }

    #[test]
    fn test_payment_status_label() {
        assert_eq!(PaymentStatus::Completed.label(), "Completed");
        assert_eq!(PaymentStatus::Failed.label(), "Pending");
    }
}
