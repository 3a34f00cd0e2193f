//! Nightly earnings reconciliation.
//!
//! Recomputes the previous month for every approved seller and records the
//! integrity warnings found, so drift between stored commissions, seller
//! attribution and the hardware topology shows up in logs and metrics.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use domain::services::EarningsService;
use shared::period::MonthKey;
use tracing::{info, warn};

use super::scheduler::{Job, JobError};
use crate::middleware::metrics::record_snapshot;

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub month: Option<MonthKey>,
    pub sellers: usize,
    pub failed: usize,
    pub warnings: usize,
}

pub struct ReconciliationJob {
    service: EarningsService,
    interval: Duration,
}

impl ReconciliationJob {
    pub fn new(service: EarningsService, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Reconcile the month before the one containing `today`.
    pub async fn reconcile(&self, today: NaiveDate) -> Result<ReconciliationReport, JobError> {
        let month = MonthKey::containing(today).previous();
        let seller_ids = self.service.store().find_approved_seller_ids().await?;

        let mut report = ReconciliationReport {
            month: Some(month),
            sellers: seller_ids.len(),
            ..Default::default()
        };

        for seller_id in seller_ids {
            match self.service.try_aggregate(seller_id, month).await {
                Ok(snapshot) => {
                    record_snapshot(&snapshot, "reconciliation");
                    for warning in &snapshot.warnings {
                        warn!(
                            seller_id = %seller_id,
                            month = %month,
                            kind = warning.kind(),
                            subscription_id = %warning.subscription_id(),
                            "Reconciliation found integrity warning"
                        );
                    }
                    report.warnings += snapshot.warnings.len();
                }
                Err(e) => {
                    warn!(seller_id = %seller_id, month = %month, error = %e, "Reconciliation failed for seller");
                    metrics::counter!("earnings_reconciliation_failures_total").increment(1);
                    report.failed += 1;
                }
            }
        }

        info!(
            month = %month,
            sellers = report.sellers,
            failed = report.failed,
            warnings = report.warnings,
            "Earnings reconciliation finished"
        );
        Ok(report)
    }
}

#[async_trait::async_trait]
impl Job for ReconciliationJob {
    fn name(&self) -> &'static str {
        "earnings_reconciliation"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> Result<(), JobError> {
        let report = self.reconcile(Utc::now().date_naive()).await?;
        if report.failed > 0 && report.failed == report.sellers {
            return Err(JobError(format!(
                "all {} sellers failed to reconcile",
                report.failed
            )));
        }
        Ok(())
    }
}
