//! Seller earnings pipeline: topology resolution, windowed subscription
//! queries, commission aggregation and the monthly breakdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::future::join_all;
use rust_decimal::Decimal;
use shared::money::{round_cents, round_currency};
use shared::period::MonthKey;
use shared::validation::{validate_months_back, MAX_MONTHS_BACK};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::store::{EarningsStore, StoreError};
use crate::models::{
    CommissionPolicy, EarningsSnapshot, FailureKind, FailureTag, IntegrityWarning,
    MonthlyEarningsSummary, RecentTransaction, Seller, SellerTopology, SnapshotStatus,
    Subscription,
};

/// Default timeout for a single-month aggregation.
pub const DEFAULT_AGGREGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default size of the recent transactions list.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Error type for earnings computations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EarningsError {
    #[error("Seller ID is required")]
    SellerIdRequired,

    #[error("Months back must be between 1 and {max}, got {requested}")]
    InvalidMonthsBack { requested: u32, max: u32 },

    #[error("Failed to fetch earnings data: {0}")]
    Fetch(#[from] StoreError),

    #[error("Earnings computation timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl EarningsError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EarningsError::Fetch(_) | EarningsError::Timeout { .. })
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            EarningsError::SellerIdRequired
            | EarningsError::InvalidMonthsBack { .. } => FailureKind::Input,
            EarningsError::Fetch(_) => FailureKind::Fetch,
            EarningsError::Timeout { .. } => FailureKind::Timeout,
        }
    }

    pub fn to_failure_tag(&self) -> FailureTag {
        FailureTag {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Computes seller earnings from an [`EarningsStore`].
///
/// Stateless apart from its configuration; cheap to clone.
#[derive(Clone)]
pub struct EarningsService {
    store: Arc<dyn EarningsStore>,
    policy: CommissionPolicy,
    timeout: Duration,
    recent_limit: usize,
}

impl EarningsService {
    pub fn new(store: Arc<dyn EarningsStore>) -> Self {
        Self {
            store,
            policy: CommissionPolicy::default(),
            timeout: DEFAULT_AGGREGATION_TIMEOUT,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    pub fn with_policy(mut self, policy: CommissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn policy(&self) -> &CommissionPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn EarningsStore> {
        &self.store
    }

    /// Gateways owned by the seller and the devices behind them.
    ///
    /// An absent seller id yields an empty topology without querying.
    pub async fn resolve_topology(
        &self,
        seller_id: Option<Uuid>,
    ) -> Result<SellerTopology, EarningsError> {
        let Some(seller_id) = seller_id else {
            return Ok(SellerTopology::empty(None));
        };

        let gateways = self.store.find_gateways_by_seller(seller_id).await?;
        if gateways.is_empty() {
            debug!(seller_id = %seller_id, "Seller has no gateways");
            return Ok(SellerTopology::empty(Some(seller_id)));
        }

        let gateway_ids: Vec<Uuid> = gateways.iter().map(|g| g.id).collect();
        let devices = self.store.find_devices_by_gateways(&gateway_ids).await?;

        debug!(
            seller_id = %seller_id,
            gateways = gateway_ids.len(),
            devices = devices.len(),
            "Resolved seller topology"
        );

        Ok(SellerTopology {
            seller_id: Some(seller_id),
            gateway_ids,
            devices,
        })
    }

    /// Completed subscriptions of the devices with `valid_from` in the month,
    /// newest first.
    pub async fn query_window(
        &self,
        device_ids: &[String],
        month: MonthKey,
    ) -> Result<Vec<Subscription>, EarningsError> {
        if device_ids.is_empty() {
            return Ok(Vec::new());
        }

        let window = month.window();
        let mut rows: Vec<Subscription> = self
            .store
            .find_completed_subscriptions(device_ids, window)
            .await?
            .into_iter()
            .filter(|s| s.is_completed() && window.contains(&s.valid_from))
            .collect();
        rows.sort_by(|a, b| b.valid_from.cmp(&a.valid_from));
        Ok(rows)
    }

    /// Commission rate for the seller: stored rate, then the active global
    /// rate, then the configured default.
    pub async fn resolve_commission_rate(
        &self,
        seller: Option<&Seller>,
    ) -> Result<Decimal, EarningsError> {
        if let Some(rate) = seller.and_then(|s| s.commission_rate) {
            return Ok(rate);
        }
        Ok(self
            .store
            .find_active_commission_rate()
            .await?
            .unwrap_or(self.policy.default_rate))
    }

    /// Earnings snapshot for the seller and month (current month when absent).
    ///
    /// Only a missing seller id is an error. Fetch failures and timeouts yield
    /// a zeroed snapshot whose `status` carries the failure.
    pub async fn aggregate(
        &self,
        seller_id: Option<Uuid>,
        month: Option<MonthKey>,
    ) -> Result<EarningsSnapshot, EarningsError> {
        let seller_id = seller_id.ok_or(EarningsError::SellerIdRequired)?;
        let month = month.unwrap_or_else(MonthKey::current);

        match self.try_aggregate(seller_id, month).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                warn!(
                    seller_id = %seller_id,
                    month = %month,
                    error = %err,
                    "Earnings aggregation failed"
                );
                Ok(EarningsSnapshot::failed(
                    Some(seller_id),
                    month,
                    err.kind(),
                    err.to_string(),
                ))
            }
        }
    }

    /// Like [`aggregate`](Self::aggregate) but surfaces failures as errors.
    pub async fn try_aggregate(
        &self,
        seller_id: Uuid,
        month: MonthKey,
    ) -> Result<EarningsSnapshot, EarningsError> {
        self.with_timeout_limit(async {
            let topology = self.resolve_topology(Some(seller_id)).await?;
            if !topology.has_devices() {
                return Ok(EarningsSnapshot::zero(
                    Some(seller_id),
                    month,
                    self.policy.default_rate,
                ));
            }
            let seller = self.store.find_seller(seller_id).await?;
            let rate = self.resolve_commission_rate(seller.as_ref()).await?;
            self.snapshot_for(&topology, month, rate).await
        })
        .await
    }

    /// Monthly earnings for the `months_back` trailing months ending with the
    /// month containing `today`, oldest first.
    ///
    /// Topology is resolved once. Months are computed concurrently and a
    /// failed month becomes a zero entry tagged with its failure.
    pub async fn breakdown(
        &self,
        seller_id: Option<Uuid>,
        months_back: u32,
        today: NaiveDate,
    ) -> Result<Vec<MonthlyEarningsSummary>, EarningsError> {
        let seller_id = seller_id.ok_or(EarningsError::SellerIdRequired)?;
        if validate_months_back(months_back).is_err() {
            return Err(EarningsError::InvalidMonthsBack {
                requested: months_back,
                max: MAX_MONTHS_BACK,
            });
        }

        let months = MonthKey::containing(today).trailing(months_back);

        let prepared = self
            .with_timeout_limit(async {
                let topology = self.resolve_topology(Some(seller_id)).await?;
                if !topology.has_devices() {
                    return Ok((topology, self.policy.default_rate));
                }
                let seller = self.store.find_seller(seller_id).await?;
                let rate = self.resolve_commission_rate(seller.as_ref()).await?;
                Ok::<_, EarningsError>((topology, rate))
            })
            .await;

        let (topology, rate) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(
                    seller_id = %seller_id,
                    error = %err,
                    "Topology resolution failed, degrading breakdown"
                );
                let failure = err.to_failure_tag();
                return Ok(months
                    .into_iter()
                    .map(|month| MonthlyEarningsSummary::failed(month, failure.clone()))
                    .collect());
            }
        };

        let topology = &topology;
        let results = join_all(months.iter().map(|&month| async move {
            let result = self
                .with_timeout_limit(self.snapshot_for(topology, month, rate))
                .await;
            (month, result)
        }))
        .await;

        let entries = results
            .into_iter()
            .map(|(month, result)| match result {
                Ok(snapshot) => MonthlyEarningsSummary::from_snapshot(&snapshot),
                Err(err) => {
                    warn!(
                        seller_id = %seller_id,
                        month = %month,
                        error = %err,
                        "Monthly earnings failed"
                    );
                    MonthlyEarningsSummary::failed(month, err.to_failure_tag())
                }
            })
            .collect::<Vec<_>>();

        info!(
            seller_id = %seller_id,
            months = entries.len(),
            failed = entries.iter().filter(|e| e.failure.is_some()).count(),
            "Computed monthly earnings breakdown"
        );

        Ok(entries)
    }

    pub(crate) async fn snapshot_for(
        &self,
        topology: &SellerTopology,
        month: MonthKey,
        rate: Decimal,
    ) -> Result<EarningsSnapshot, EarningsError> {
        let subscriptions = self.query_window(&topology.device_ids(), month).await?;
        Ok(compute_snapshot(
            topology,
            month,
            subscriptions,
            rate,
            &self.policy,
            self.recent_limit,
        ))
    }

    pub(crate) async fn with_timeout_limit<T, F>(&self, future: F) -> Result<T, EarningsError>
    where
        F: Future<Output = Result<T, EarningsError>>,
    {
        match tokio::time::timeout(self.timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(EarningsError::Timeout {
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

/// Integrity checks for one subscription against the topology and rate.
pub fn check_integrity(
    subscription: &Subscription,
    topology_seller_id: Option<Uuid>,
    rate: Decimal,
    policy: &CommissionPolicy,
) -> Vec<IntegrityWarning> {
    let mut warnings = Vec::new();

    if let (Some(recorded), Some(owner)) = (subscription.seller_id, topology_seller_id) {
        if recorded != owner {
            warnings.push(IntegrityWarning::SellerMismatch {
                subscription_id: subscription.id,
                recorded_seller_id: recorded,
                topology_seller_id: owner,
            });
        }
    }

    if let Some((stored, computed)) = policy.reconcile(subscription, rate) {
        warnings.push(IntegrityWarning::CommissionMismatch {
            subscription_id: subscription.id,
            stored,
            computed,
        });
    }

    if !subscription.has_valid_range() {
        warnings.push(IntegrityWarning::InvalidValidityRange {
            subscription_id: subscription.id,
            valid_from: subscription.valid_from,
            valid_until: subscription.valid_until,
        });
    }

    warnings
}

/// Builds a snapshot from already-windowed subscriptions.
///
/// Commission is summed per record and rounded once at the end.
pub fn compute_snapshot(
    topology: &SellerTopology,
    month: MonthKey,
    subscriptions: Vec<Subscription>,
    rate: Decimal,
    policy: &CommissionPolicy,
    recent_limit: usize,
) -> EarningsSnapshot {
    let mut earnings = Decimal::ZERO;
    let mut total_amount = Decimal::ZERO;
    let mut warnings = Vec::new();

    for subscription in &subscriptions {
        total_amount += subscription.amount;
        earnings += policy.commission_for(subscription, rate);
        warnings.extend(check_integrity(subscription, topology.seller_id, rate, policy));
    }

    for warning in &warnings {
        warn!(
            seller_id = ?topology.seller_id,
            month = %month,
            subscription_id = %warning.subscription_id(),
            kind = warning.kind(),
            "Earnings integrity warning"
        );
    }

    let lookup = topology.device_lookup();
    let recent_transactions = subscriptions
        .iter()
        .take(recent_limit)
        .map(|s| {
            let device = lookup.get(s.device_id.as_str());
            RecentTransaction {
                id: s.id,
                date: s.valid_from.date_naive(),
                device_id: s.device_id.clone(),
                device_name: device
                    .and_then(|d| d.device_name.clone())
                    .unwrap_or_else(|| "N/A".to_string()),
                customer_name: device
                    .and_then(|d| d.customer_name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                customer_phone: device.and_then(|d| d.customer_phone.clone()),
                customer_email: device.and_then(|d| d.customer_email.clone()),
                recharge_amount: s.amount,
                commission: round_cents(policy.commission_for(s, rate)),
                status: s.payment_status.label().to_string(),
                plan_name: s.plan_name_or_default().to_string(),
            }
        })
        .collect();

    let devices_recharged = subscriptions.len();

    EarningsSnapshot {
        seller_id: topology.seller_id,
        month,
        this_month: round_currency(earnings),
        devices_recharged,
        total_recharge_amount: round_currency(total_amount),
        recharge_rate: if devices_recharged > 0 { 100 } else { 0 },
        commission_rate: rate,
        recent_transactions,
        subscriptions,
        warnings,
        status: SnapshotStatus::Ok,
    }
}
