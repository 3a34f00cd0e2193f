//! Dashboard extras: plan distribution, headline summary and month picker.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::money::{percent_change, round_currency};
use shared::period::MonthKey;
use uuid::Uuid;

use super::earnings::{EarningsError, EarningsService};
use crate::models::{DashboardSummary, MonthOption, PlanDistribution, PlanShare};

/// `monthly_basic` becomes `Monthly basic`.
pub fn plan_display_name(plan_type: &str) -> String {
    let mut chars = plan_type.chars();
    match chars.next() {
        Some(first) => {
            let rest: String = chars.collect();
            format!("{}{}", first.to_uppercase(), rest.replacen('_', " ", 1))
        }
        None => String::new(),
    }
}

/// The last `count` months ending with the month containing `today`, newest first.
pub fn month_options(today: NaiveDate, count: u32) -> Vec<MonthOption> {
    let current = MonthKey::containing(today);
    (0..count)
        .map(|back| {
            let month = current.months_before(back);
            MonthOption {
                value: month,
                label: month.long_label(),
            }
        })
        .collect()
}

#[derive(Default)]
struct PlanTotals {
    count: usize,
    amount: Decimal,
    commission: Decimal,
}

impl EarningsService {
    /// Completed recharges in the month grouped by plan type.
    pub async fn distribution(
        &self,
        seller_id: Option<Uuid>,
        month: Option<MonthKey>,
    ) -> Result<PlanDistribution, EarningsError> {
        let seller_id = seller_id.ok_or(EarningsError::SellerIdRequired)?;
        let month = month.unwrap_or_else(MonthKey::current);

        self.with_timeout_limit(async {
            let topology = self.resolve_topology(Some(seller_id)).await?;
            if !topology.has_devices() {
                return Ok(PlanDistribution {
                    month,
                    total_transactions: 0,
                    chart_data: Vec::new(),
                });
            }

            let seller = self.store().find_seller(seller_id).await?;
            let rate = self.resolve_commission_rate(seller.as_ref()).await?;
            let subscriptions = self.query_window(&topology.device_ids(), month).await?;

            let mut groups: BTreeMap<String, PlanTotals> = BTreeMap::new();
            for sub in &subscriptions {
                let plan_type = sub
                    .plan_type
                    .clone()
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| "unknown".to_string());
                let totals = groups.entry(plan_type).or_default();
                totals.count += 1;
                totals.amount += sub.amount;
                totals.commission += self.policy().commission_for(sub, rate);
            }

            let total = subscriptions.len();
            let chart_data = groups
                .into_iter()
                .map(|(plan_type, totals)| PlanShare {
                    name: plan_display_name(&plan_type),
                    plan_type,
                    value: totals.count,
                    percentage: share_percentage(totals.count, total),
                    total_amount: round_currency(totals.amount),
                    total_commission: round_currency(totals.commission),
                })
                .collect();

            Ok::<_, EarningsError>(PlanDistribution {
                month,
                total_transactions: total,
                chart_data,
            })
        })
        .await
    }

    /// Growth of this month's earnings over last month's and the device count.
    pub async fn summary(
        &self,
        seller_id: Option<Uuid>,
        today: NaiveDate,
    ) -> Result<DashboardSummary, EarningsError> {
        let seller_id = seller_id.ok_or(EarningsError::SellerIdRequired)?;
        let current = MonthKey::containing(today);

        let (this_month, last_month, topology) = futures::try_join!(
            self.try_aggregate(seller_id, current),
            self.try_aggregate(seller_id, current.previous()),
            self.resolve_topology(Some(seller_id)),
        )?;

        Ok(DashboardSummary {
            earnings_growth: percent_change(last_month.this_month, this_month.this_month),
            total_devices_managed: topology.device_count(),
            last_month_earnings: last_month.this_month,
            this_month_earnings: this_month.this_month,
        })
    }
}

fn share_percentage(count: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(count) * Decimal::ONE_HUNDRED / Decimal::from(total))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}
