//! Read access to the data the earnings pipeline needs.
//!
//! The pipeline depends only on [`EarningsStore`]. The PostgreSQL
//! implementation lives in the persistence crate; [`MemoryEarningsStore`]
//! serves tests and database-less local runs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::period::MonthWindow;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Device, Gateway, Seller, Subscription};

/// Error type for data store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Data store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed record: {0}")]
    Decode(String),
}

/// Data access required by the earnings pipeline.
#[async_trait]
pub trait EarningsStore: Send + Sync {
    /// Gateways owned by the seller.
    async fn find_gateways_by_seller(&self, seller_id: Uuid) -> Result<Vec<Gateway>, StoreError>;

    /// Devices attached to any of the gateways.
    async fn find_devices_by_gateways(&self, gateway_ids: &[Uuid])
        -> Result<Vec<Device>, StoreError>;

    /// Completed subscriptions for the devices whose `valid_from` falls in the window.
    async fn find_completed_subscriptions(
        &self,
        device_ids: &[String],
        window: MonthWindow,
    ) -> Result<Vec<Subscription>, StoreError>;

    async fn find_seller(&self, seller_id: Uuid) -> Result<Option<Seller>, StoreError>;

    /// The active global commission rate, if one is configured.
    async fn find_active_commission_rate(&self) -> Result<Option<Decimal>, StoreError>;

    /// Ids of all approved, active sellers.
    async fn find_approved_seller_ids(&self) -> Result<Vec<Uuid>, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryData {
    sellers: HashMap<Uuid, Seller>,
    gateways: Vec<Gateway>,
    devices: Vec<Device>,
    subscriptions: Vec<Subscription>,
    commission_rate: Option<Decimal>,
}

/// In-memory [`EarningsStore`] with failure injection for tests.
#[derive(Debug, Default)]
pub struct MemoryEarningsStore {
    data: RwLock<MemoryData>,
    unavailable: AtomicBool,
    failing_windows: RwLock<HashSet<DateTime<Utc>>>,
    subscription_delay: RwLock<Option<Duration>>,
    gateway_lookups: AtomicUsize,
    subscription_lookups: AtomicUsize,
}

impl MemoryEarningsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_seller(&self, seller: Seller) {
        if let Ok(mut data) = self.data.write() {
            data.sellers.insert(seller.id, seller);
        }
    }

    pub fn insert_gateway(&self, gateway: Gateway) {
        if let Ok(mut data) = self.data.write() {
            data.gateways.push(gateway);
        }
    }

    pub fn insert_device(&self, device: Device) {
        if let Ok(mut data) = self.data.write() {
            data.devices.push(device);
        }
    }

    pub fn insert_subscription(&self, subscription: Subscription) {
        if let Ok(mut data) = self.data.write() {
            data.subscriptions.push(subscription);
        }
    }

    pub fn set_commission_rate(&self, rate: Option<Decimal>) {
        if let Ok(mut data) = self.data.write() {
            data.commission_rate = rate;
        }
    }

    /// Make every query fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make subscription queries for the window starting at `start` fail.
    pub fn fail_window(&self, start: DateTime<Utc>) {
        if let Ok(mut windows) = self.failing_windows.write() {
            windows.insert(start);
        }
    }

    /// Delay every subscription query.
    pub fn set_subscription_delay(&self, delay: Option<Duration>) {
        if let Ok(mut current) = self.subscription_delay.write() {
            *current = delay;
        }
    }

    /// Number of gateway lookups served so far.
    pub fn gateway_lookups(&self) -> usize {
        self.gateway_lookups.load(Ordering::SeqCst)
    }

    /// Number of subscription queries served so far.
    pub fn subscription_lookups(&self) -> usize {
        self.subscription_lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryData>, StoreError> {
        self.data
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl EarningsStore for MemoryEarningsStore {
    async fn find_gateways_by_seller(&self, seller_id: Uuid) -> Result<Vec<Gateway>, StoreError> {
        self.gateway_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .read()?
            .gateways
            .iter()
            .filter(|g| g.seller_id == Some(seller_id))
            .cloned()
            .collect())
    }

    async fn find_devices_by_gateways(
        &self,
        gateway_ids: &[Uuid],
    ) -> Result<Vec<Device>, StoreError> {
        self.check_available()?;
        Ok(self
            .read()?
            .devices
            .iter()
            .filter(|d| d.gateway_id.is_some_and(|g| gateway_ids.contains(&g)))
            .cloned()
            .collect())
    }

    async fn find_completed_subscriptions(
        &self,
        device_ids: &[String],
        window: MonthWindow,
    ) -> Result<Vec<Subscription>, StoreError> {
        self.subscription_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let delay = self.subscription_delay.read().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing_windows
            .read()
            .map(|w| w.contains(&window.start))
            .unwrap_or(false);
        if failing {
            return Err(StoreError::Query(format!(
                "injected failure for window starting {}",
                window.start
            )));
        }

        let mut rows: Vec<Subscription> = self
            .read()?
            .subscriptions
            .iter()
            .filter(|s| {
                s.is_completed()
                    && window.contains(&s.valid_from)
                    && device_ids.iter().any(|d| *d == s.device_id)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.valid_from.cmp(&a.valid_from));
        Ok(rows)
    }

    async fn find_seller(&self, seller_id: Uuid) -> Result<Option<Seller>, StoreError> {
        self.check_available()?;
        Ok(self.read()?.sellers.get(&seller_id).cloned())
    }

    async fn find_active_commission_rate(&self) -> Result<Option<Decimal>, StoreError> {
        self.check_available()?;
        Ok(self.read()?.commission_rate)
    }

    async fn find_approved_seller_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        self.check_available()?;
        let mut ids: Vec<Uuid> = self
            .read()?
            .sellers
            .values()
            .filter(|s| s.is_approved && s.is_active)
            .map(|s| s.id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}
