//! Per-session earnings dashboard state.
//!
//! Orchestrates the earnings service for one viewer and publishes the
//! resulting state over a `watch` channel. All mutation goes through the
//! methods here; the service itself stays stateless.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use serde::Serialize;
use shared::period::MonthKey;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use super::earnings::{EarningsError, EarningsService};
use super::export::CsvExport;
use super::notifier::{EarningsNotifier, SubscriptionHandle};
use crate::models::{
    DashboardSummary, EarningsSnapshot, MonthlyEarningsSummary, SnapshotStatus,
    DEFAULT_COMMISSION_RATE,
};
use crate::models::query::DEFAULT_BREAKDOWN_MONTHS;

/// Everything a dashboard view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub seller_id: Option<Uuid>,
    pub selected_month: MonthKey,
    pub is_loading: bool,
    pub is_exporting: bool,
    pub error: Option<String>,
    pub earnings: EarningsSnapshot,
    pub monthly_breakdown: Vec<MonthlyEarningsSummary>,
    pub summary: Option<DashboardSummary>,
}

impl DashboardState {
    pub fn new(selected_month: MonthKey) -> Self {
        Self {
            seller_id: None,
            selected_month,
            is_loading: false,
            is_exporting: false,
            error: None,
            earnings: EarningsSnapshot::zero(None, selected_month, DEFAULT_COMMISSION_RATE),
            monthly_breakdown: Vec::new(),
            summary: None,
        }
    }
}

/// Dashboard state container for one viewing session.
pub struct EarningsDashboard {
    service: EarningsService,
    notifier: Option<EarningsNotifier>,
    breakdown_months: u32,
    state: watch::Sender<DashboardState>,
    /// Loads in flight; `is_loading` stays set until this drops to zero.
    pending_loads: AtomicUsize,
    live: Mutex<Option<SubscriptionHandle>>,
    this: Weak<EarningsDashboard>,
}

impl EarningsDashboard {
    pub fn new(service: EarningsService, notifier: Option<EarningsNotifier>) -> Arc<Self> {
        Self::with_breakdown_months(service, notifier, DEFAULT_BREAKDOWN_MONTHS)
    }

    pub fn with_breakdown_months(
        service: EarningsService,
        notifier: Option<EarningsNotifier>,
        breakdown_months: u32,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(DashboardState::new(MonthKey::current()));
        Arc::new_cyclic(|this| Self {
            service,
            notifier,
            breakdown_months,
            state,
            pending_loads: AtomicUsize::new(0),
            live: Mutex::new(None),
            this: this.clone(),
        })
    }

    /// Current state.
    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn is_live(&self) -> bool {
        self.live
            .lock()
            .map(|live| live.as_ref().is_some_and(|h| h.is_active()))
            .unwrap_or(false)
    }

    /// Load everything for the seller and start listening for changes.
    pub async fn init(&self, seller_id: Option<Uuid>) -> Result<(), EarningsError> {
        let Some(seller_id) = seller_id else {
            self.state.send_modify(|s| {
                s.error = Some(EarningsError::SellerIdRequired.to_string());
            });
            return Err(EarningsError::SellerIdRequired);
        };

        self.teardown();
        self.state.send_modify(|s| {
            s.seller_id = Some(seller_id);
            s.error = None;
        });

        self.load_all().await;
        self.register_listener(seller_id);

        info!(seller_id = %seller_id, "Earnings dashboard initialised");
        Ok(())
    }

    /// Switch the selected month and reload its snapshot.
    pub async fn update_month(&self, month: MonthKey) {
        self.state.send_modify(|s| s.selected_month = month);
        self.load_snapshot().await;
    }

    /// Recompute everything for the current seller and month.
    pub async fn refresh(&self) {
        let has_seller = self.state.borrow().seller_id.is_some();
        if has_seller {
            self.load_all().await;
        }
    }

    /// CSV report for the selected month.
    pub async fn export_data(&self) -> Result<CsvExport, EarningsError> {
        let (seller_id, month) = {
            let state = self.state.borrow();
            (state.seller_id, state.selected_month)
        };

        self.state.send_modify(|s| s.is_exporting = true);
        let result = self.service.export_csv(seller_id, Some(month)).await;
        self.state.send_modify(|s| {
            s.is_exporting = false;
            match &result {
                Ok(export) if export.is_failed() => {
                    s.error = Some("Failed to export earnings data".to_string());
                }
                Err(err) => s.error = Some(err.to_string()),
                Ok(_) => {}
            }
        });
        result
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    /// Stop listening for changes. Safe to call repeatedly.
    pub fn teardown(&self) {
        let handle = self.live.lock().ok().and_then(|mut live| live.take());
        if let Some(handle) = handle {
            handle.unsubscribe();
        }
    }

    async fn load_all(&self) {
        let (seller_id, month) = {
            let state = self.state.borrow();
            (state.seller_id, state.selected_month)
        };
        self.begin_load();

        let today = Utc::now().date_naive();
        let (snapshot, breakdown, summary) = tokio::join!(
            self.service.aggregate(seller_id, Some(month)),
            self.service.breakdown(seller_id, self.breakdown_months, today),
            self.service.summary(seller_id, today),
        );

        self.finish_load(|s| {
            if s.selected_month == month {
                apply_snapshot(s, snapshot);
            }
            match breakdown {
                Ok(entries) => s.monthly_breakdown = entries,
                Err(err) => warn!(error = %err, "Monthly breakdown unavailable"),
            }
            match summary {
                Ok(summary) => s.summary = Some(summary),
                Err(err) => warn!(error = %err, "Dashboard summary unavailable"),
            }
        });
    }

    async fn load_snapshot(&self) {
        let (seller_id, month) = {
            let state = self.state.borrow();
            (state.seller_id, state.selected_month)
        };
        self.begin_load();

        let snapshot = self.service.aggregate(seller_id, Some(month)).await;

        self.finish_load(|s| {
            if s.selected_month == month {
                apply_snapshot(s, snapshot);
            }
        });
    }

    fn begin_load(&self) {
        self.pending_loads.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| s.is_loading = true);
    }

    fn finish_load(&self, apply: impl FnOnce(&mut DashboardState)) {
        let remaining = self.pending_loads.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        self.state.send_modify(|s| {
            s.is_loading = remaining > 0;
            apply(s);
        });
    }

    fn register_listener(&self, seller_id: Uuid) {
        let Some(notifier) = &self.notifier else {
            info!(seller_id = %seller_id, "Live updates disabled");
            return;
        };

        let this = self.this.clone();
        let registered = notifier.subscribe(seller_id, move |_event| {
            let this = this.clone();
            async move {
                if let Some(dashboard) = this.upgrade() {
                    dashboard.refresh().await;
                }
            }
        });

        match registered {
            Ok(handle) => {
                if let Ok(mut live) = self.live.lock() {
                    *live = Some(handle);
                }
            }
            Err(err) => {
                warn!(seller_id = %seller_id, error = %err, "Failed to register live updates");
            }
        }
    }
}

impl Drop for EarningsDashboard {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn apply_snapshot(state: &mut DashboardState, result: Result<EarningsSnapshot, EarningsError>) {
    match result {
        Ok(snapshot) => {
            state.error = match &snapshot.status {
                SnapshotStatus::Ok => None,
                SnapshotStatus::Failed { message, .. } => Some(message.clone()),
            };
            state.earnings = snapshot;
        }
        Err(err) => {
            state.error = Some(err.to_string());
            state.earnings = EarningsSnapshot::failed(
                state.seller_id,
                state.selected_month,
                err.kind(),
                err.to_string(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifier::{ChangeOperation, SubscriptionChange};
    use crate::services::testing::{fixture, subscription_in, Fixture};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::time::Duration;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_init_requires_seller() {
        let Fixture { store, .. } = fixture();
        let dashboard = EarningsDashboard::new(EarningsService::new(store), None);

        let result = dashboard.init(None).await;

        assert_eq!(result, Err(EarningsError::SellerIdRequired));
        assert_eq!(dashboard.state().error.as_deref(), Some("Seller ID is required"));
    }

    #[tokio::test]
    async fn test_init_loads_snapshot_breakdown_and_summary() {
        let Fixture { store, seller_id, .. } = fixture();
        let now = Utc::now();
        let sub = subscription_in(
            "D1",
            chrono::Datelike::year(&now),
            chrono::Datelike::month(&now),
            1,
            "500",
            None,
            Some(seller_id),
        );
        store.insert_subscription(sub);
        let dashboard = EarningsDashboard::new(EarningsService::new(store), None);

        dashboard.init(Some(seller_id)).await.unwrap();

        let state = dashboard.state();
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert_eq!(state.earnings.this_month, dec("50"));
        assert_eq!(state.monthly_breakdown.len(), DEFAULT_BREAKDOWN_MONTHS as usize);
        assert_eq!(state.summary.unwrap().this_month_earnings, dec("50"));
    }

    #[tokio::test]
    async fn test_failed_snapshot_sets_visible_error() {
        let Fixture { store, seller_id, .. } = fixture();
        store.set_unavailable(true);
        let dashboard = EarningsDashboard::new(EarningsService::new(store), None);

        dashboard.init(Some(seller_id)).await.unwrap();

        let state = dashboard.state();
        assert!(state.error.is_some());
        assert_eq!(state.earnings.this_month, Decimal::ZERO);
        assert!(!state.earnings.status.is_ok());

        dashboard.clear_error();
        assert!(dashboard.state().error.is_none());
    }

    #[tokio::test]
    async fn test_update_month_reloads_snapshot() {
        let Fixture { store, seller_id, .. } = fixture();
        store.insert_subscription(subscription_in("D2", 2024, 11, 5, "800", None, None));
        let dashboard = EarningsDashboard::new(EarningsService::new(store), None);
        dashboard.init(Some(seller_id)).await.unwrap();

        let november = MonthKey::new(2024, 11).unwrap();
        dashboard.update_month(november).await;

        let state = dashboard.state();
        assert_eq!(state.selected_month, november);
        assert_eq!(state.earnings.month, november);
        assert_eq!(state.earnings.this_month, dec("80"));
    }

    #[tokio::test]
    async fn test_export_uses_selected_month() {
        let Fixture { store, seller_id, .. } = fixture();
        let dashboard = EarningsDashboard::new(EarningsService::new(store), None);
        dashboard.init(Some(seller_id)).await.unwrap();
        dashboard.update_month(MonthKey::new(2024, 11).unwrap()).await;

        let export = dashboard.export_data().await.unwrap();

        assert_eq!(export.filename, "earnings_report_2024-11.csv");
        assert!(!dashboard.state().is_exporting);
    }

    #[tokio::test]
    async fn test_change_event_triggers_refresh() {
        let Fixture { store, seller_id, .. } = fixture();
        let notifier = EarningsNotifier::default();
        let dashboard =
            EarningsDashboard::new(EarningsService::new(store.clone()), Some(notifier.clone()));
        dashboard.init(Some(seller_id)).await.unwrap();
        assert!(dashboard.is_live());
        let mut updates = dashboard.watch();
        updates.borrow_and_update();

        let now = Utc::now();
        let sub = subscription_in(
            "D1",
            chrono::Datelike::year(&now),
            chrono::Datelike::month(&now),
            1,
            "300",
            None,
            Some(seller_id),
        );
        let subscription_id = sub.id;
        store.insert_subscription(sub);
        notifier.publish(SubscriptionChange {
            operation: ChangeOperation::Insert,
            subscription_id,
            device_id: Some("D1".to_string()),
            seller_id: Some(seller_id),
        });

        let refreshed = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                updates.changed().await.unwrap();
                let state = updates.borrow_and_update().clone();
                if !state.is_loading && state.earnings.this_month == dec("30") {
                    return state;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(refreshed.earnings.devices_recharged, 1);
    }

    #[tokio::test]
    async fn test_loading_flag_held_until_every_load_finishes() {
        let Fixture { store, seller_id, .. } = fixture();
        let dashboard = EarningsDashboard::new(EarningsService::new(store), None);
        dashboard.init(Some(seller_id)).await.unwrap();

        dashboard.begin_load();
        dashboard.begin_load();
        assert!(dashboard.state().is_loading);

        dashboard.finish_load(|_| {});
        assert!(dashboard.state().is_loading);

        dashboard.finish_load(|_| {});
        assert!(!dashboard.state().is_loading);
    }

    #[tokio::test]
    async fn test_overlapping_refresh_and_month_switch_keep_selected_month() {
        let Fixture { store, seller_id, .. } = fixture();
        store.insert_subscription(subscription_in("D2", 2024, 11, 5, "800", None, None));
        let dashboard = EarningsDashboard::new(EarningsService::new(store.clone()), None);
        dashboard.init(Some(seller_id)).await.unwrap();
        store.set_subscription_delay(Some(Duration::from_millis(30)));

        let november = MonthKey::new(2024, 11).unwrap();
        tokio::join!(dashboard.refresh(), dashboard.update_month(november));

        let state = dashboard.state();
        assert!(!state.is_loading);
        assert_eq!(state.earnings.month, november);
        assert_eq!(state.earnings.this_month, dec("80"));
    }

    #[tokio::test]
    async fn test_reinit_replaces_listener_and_teardown_stops_it() {
        let Fixture { store, seller_id, .. } = fixture();
        let notifier = EarningsNotifier::default();
        let dashboard = EarningsDashboard::new(EarningsService::new(store), Some(notifier.clone()));

        dashboard.init(Some(seller_id)).await.unwrap();
        dashboard.init(Some(seller_id)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(notifier.listener_count(), 1);

        dashboard.teardown();
        dashboard.teardown();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!dashboard.is_live());
        assert_eq!(notifier.listener_count(), 0);
    }
}
