//! Earnings projections derived from topology and subscriptions.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::money::commission_for;
use shared::period::MonthKey;
use uuid::Uuid;

use super::subscription::Subscription;

/// Commission percentage used when neither the seller nor a global record sets one.
pub const DEFAULT_COMMISSION_RATE: Decimal = Decimal::TEN;

/// Which per-record commission value counts toward earnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommissionSource {
    /// Stored `commission_amount` when present, otherwise computed from the rate.
    #[default]
    Stored,
    /// Always `amount * rate / 100`.
    Computed,
}

/// How commission is derived and reconciled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommissionPolicy {
    pub default_rate: Decimal,
    pub source: CommissionSource,
    /// Allowed absolute difference between stored and computed commission.
    pub tolerance: Decimal,
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            default_rate: DEFAULT_COMMISSION_RATE,
            source: CommissionSource::Stored,
            tolerance: Decimal::new(1, 2),
        }
    }
}

impl CommissionPolicy {
    /// Commission credited for one subscription at `rate`.
    pub fn commission_for(&self, subscription: &Subscription, rate: Decimal) -> Decimal {
        let computed = commission_for(subscription.amount, rate);
        match (self.source, subscription.commission_amount) {
            (CommissionSource::Stored, Some(stored)) => stored,
            _ => computed,
        }
    }

    /// Returns `(stored, computed)` when the stored commission disagrees beyond tolerance.
    pub fn reconcile(&self, subscription: &Subscription, rate: Decimal) -> Option<(Decimal, Decimal)> {
        let stored = subscription.commission_amount?;
        let computed = commission_for(subscription.amount, rate);
        if (stored - computed).abs() > self.tolerance {
            Some((stored, computed))
        } else {
            None
        }
    }
}

/// Data integrity problems found while computing earnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IntegrityWarning {
    /// Denormalized seller reference disagrees with the device topology.
    #[serde(rename_all = "camelCase")]
    SellerMismatch {
        subscription_id: Uuid,
        recorded_seller_id: Uuid,
        topology_seller_id: Uuid,
    },
    /// Stored commission disagrees with `amount * rate / 100`.
    #[serde(rename_all = "camelCase")]
    CommissionMismatch {
        subscription_id: Uuid,
        stored: Decimal,
        computed: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    InvalidValidityRange {
        subscription_id: Uuid,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    },
}

impl IntegrityWarning {
    /// Short tag used for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            IntegrityWarning::SellerMismatch { .. } => "seller_mismatch",
            IntegrityWarning::CommissionMismatch { .. } => "commission_mismatch",
            IntegrityWarning::InvalidValidityRange { .. } => "invalid_validity_range",
        }
    }

    pub fn subscription_id(&self) -> Uuid {
        match self {
            IntegrityWarning::SellerMismatch { subscription_id, .. }
            | IntegrityWarning::CommissionMismatch { subscription_id, .. }
            | IntegrityWarning::InvalidValidityRange { subscription_id, .. } => *subscription_id,
        }
    }
}

/// Category of a computation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Input,
    Fetch,
    Timeout,
}

/// Failure carried alongside zeroed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureTag {
    pub kind: FailureKind,
    pub message: String,
}

/// Whether a snapshot reflects real data or a failed computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SnapshotStatus {
    #[default]
    Ok,
    Failed { kind: FailureKind, message: String },
}

impl SnapshotStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, SnapshotStatus::Ok)
    }

    pub fn failure(&self) -> Option<FailureTag> {
        match self {
            SnapshotStatus::Ok => None,
            SnapshotStatus::Failed { kind, message } => Some(FailureTag {
                kind: *kind,
                message: message.clone(),
            }),
        }
    }
}

/// A recharge as shown in the recent transactions list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTransaction {
    pub id: Uuid,
    pub date: NaiveDate,
    pub device_id: String,
    pub device_name: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub recharge_amount: Decimal,
    pub commission: Decimal,
    pub status: String,
    pub plan_name: String,
}

/// Earnings for one seller and one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSnapshot {
    pub seller_id: Option<Uuid>,
    pub month: MonthKey,
    /// Commission earned this month, rounded to whole currency units.
    pub this_month: Decimal,
    /// Number of completed recharges in the month.
    pub devices_recharged: usize,
    pub total_recharge_amount: Decimal,
    pub recharge_rate: u32,
    pub commission_rate: Decimal,
    pub recent_transactions: Vec<RecentTransaction>,
    pub subscriptions: Vec<Subscription>,
    pub warnings: Vec<IntegrityWarning>,
    pub status: SnapshotStatus,
}

impl EarningsSnapshot {
    /// An all-zero snapshot with an `ok` status.
    pub fn zero(seller_id: Option<Uuid>, month: MonthKey, commission_rate: Decimal) -> Self {
        Self {
            seller_id,
            month,
            this_month: Decimal::ZERO,
            devices_recharged: 0,
            total_recharge_amount: Decimal::ZERO,
            recharge_rate: 0,
            commission_rate,
            recent_transactions: Vec::new(),
            subscriptions: Vec::new(),
            warnings: Vec::new(),
            status: SnapshotStatus::Ok,
        }
    }

    /// An all-zero snapshot tagged with the failure that produced it.
    pub fn failed(
        seller_id: Option<Uuid>,
        month: MonthKey,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: SnapshotStatus::Failed {
                kind,
                message: message.into(),
            },
            ..Self::zero(seller_id, month, DEFAULT_COMMISSION_RATE)
        }
    }
}

/// One bar in the monthly earnings chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEarningsSummary {
    pub month_key: MonthKey,
    /// Chart axis label, e.g. `Mar 25`.
    pub month: String,
    /// Long label, e.g. `March 2025`.
    pub full_month: String,
    pub earnings: Decimal,
    pub transactions: usize,
    pub total_amount: Decimal,
    pub success_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureTag>,
}

impl MonthlyEarningsSummary {
    pub fn from_snapshot(snapshot: &EarningsSnapshot) -> Self {
        Self {
            month_key: snapshot.month,
            month: snapshot.month.chart_label(),
            full_month: snapshot.month.long_label(),
            earnings: snapshot.this_month,
            transactions: snapshot.devices_recharged,
            total_amount: snapshot.total_recharge_amount,
            success_rate: snapshot.recharge_rate,
            failure: snapshot.status.failure(),
        }
    }

    /// A zero entry for a month whose computation failed.
    pub fn failed(month: MonthKey, failure: FailureTag) -> Self {
        Self {
            month_key: month,
            month: month.chart_label(),
            full_month: month.long_label(),
            earnings: Decimal::ZERO,
            transactions: 0,
            total_amount: Decimal::ZERO,
            success_rate: 0,
            failure: Some(failure),
        }
    }
}

/// Recharges of one plan type within a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanShare {
    pub plan_type: String,
    /// Display name, e.g. `Monthly basic` for `monthly_basic`.
    pub name: String,
    /// Number of recharges.
    pub value: usize,
    /// Share of the month's recharges, one decimal place.
    pub percentage: Decimal,
    pub total_amount: Decimal,
    pub total_commission: Decimal,
}

/// Plan type breakdown for a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDistribution {
    pub month: MonthKey,
    pub total_transactions: usize,
    pub chart_data: Vec<PlanShare>,
}

/// Headline figures for the seller dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Percent change of this month's earnings over last month's.
    pub earnings_growth: Decimal,
    pub total_devices_managed: usize,
    pub last_month_earnings: Decimal,
    pub this_month_earnings: Decimal,
}

/// An entry in the month picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthOption {
    pub value: MonthKey,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subscription::PaymentStatus;
    use std::str::FromStr;

    fn subscription(amount: &str, stored: Option<&str>) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            device_id: "D1".to_string(),
            amount: Decimal::from_str(amount).unwrap(),
            commission_amount: stored.map(|s| Decimal::from_str(s).unwrap()),
            payment_status: PaymentStatus::Completed,
            plan_name: None,
            plan_type: None,
            valid_from: Utc::now(),
            valid_until: Utc::now(),
            seller_id: None,
        }
    }

    #[test]
    fn test_stored_source_prefers_stored_amount() {
        let policy = CommissionPolicy::default();
        let sub = subscription("500", Some("45"));
        assert_eq!(policy.commission_for(&sub, Decimal::TEN), Decimal::from(45));
    }

    #[test]
    fn test_stored_source_falls_back_to_rate() {
        let policy = CommissionPolicy::default();
        let sub = subscription("500", None);
        assert_eq!(policy.commission_for(&sub, Decimal::TEN), Decimal::from(50));
    }

    #[test]
    fn test_computed_source_ignores_stored_amount() {
        let policy = CommissionPolicy {
            source: CommissionSource::Computed,
            ..CommissionPolicy::default()
        };
        let sub = subscription("500", Some("45"));
        assert_eq!(policy.commission_for(&sub, Decimal::TEN), Decimal::from(50));
    }

    #[test]
    fn test_reconcile_within_tolerance() {
        let policy = CommissionPolicy::default();
        assert!(policy.reconcile(&subscription("500", Some("50.00")), Decimal::TEN).is_none());
        assert!(policy.reconcile(&subscription("500", None), Decimal::TEN).is_none());
        assert_eq!(
            policy.reconcile(&subscription("500", Some("45")), Decimal::TEN),
            Some((Decimal::from(45), Decimal::from(50)))
        );
    }

    #[test]
    fn test_failed_snapshot_is_zeroed() {
        let month = MonthKey::new(2025, 3).unwrap();
        let snapshot = EarningsSnapshot::failed(None, month, FailureKind::Fetch, "db down");
        assert_eq!(snapshot.this_month, Decimal::ZERO);
        assert!(!snapshot.status.is_ok());
        assert_eq!(snapshot.status.failure().unwrap().message, "db down");
    }

    #[test]
    fn test_snapshot_serialization() {
        let month = MonthKey::new(2025, 3).unwrap();
        let json = serde_json::to_value(EarningsSnapshot::zero(None, month, Decimal::TEN)).unwrap();
        assert_eq!(json["thisMonth"], serde_json::json!(0.0));
        assert_eq!(json["month"], "2025-03");
        assert_eq!(json["status"]["state"], "ok");
    }

    #[test]
    fn test_warning_serialization() {
        let warning = IntegrityWarning::SellerMismatch {
            subscription_id: Uuid::nil(),
            recorded_seller_id: Uuid::nil(),
            topology_seller_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["type"], "sellerMismatch");
        assert!(json.get("recordedSellerId").is_some());
        assert_eq!(warning.kind(), "seller_mismatch");
    }

    #[test]
    fn test_monthly_summary_labels() {
        let month = MonthKey::new(2025, 1).unwrap();
        let entry = MonthlyEarningsSummary::failed(
            month,
            FailureTag {
                kind: FailureKind::Timeout,
                message: "slow".to_string(),
            },
        );
        assert_eq!(entry.month, "Jan 25");
        assert_eq!(entry.full_month, "January 2025");
        assert_eq!(entry.earnings, Decimal::ZERO);
    }
}
