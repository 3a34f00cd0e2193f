//! PostgreSQL-backed [`EarningsStore`].

use async_trait::async_trait;
use domain::models::{Device, Gateway, Seller, Subscription};
use domain::services::{EarningsStore, StoreError};
use rust_decimal::Decimal;
use shared::period::MonthWindow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repositories::{
    CommissionRepository, DeviceRepository, GatewayRepository, SellerRepository,
    SubscriptionRepository,
};

/// Earnings data access over the repositories.
#[derive(Clone)]
pub struct PgEarningsStore {
    gateways: GatewayRepository,
    devices: DeviceRepository,
    subscriptions: SubscriptionRepository,
    sellers: SellerRepository,
    commissions: CommissionRepository,
}

impl PgEarningsStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            gateways: GatewayRepository::new(pool.clone()),
            devices: DeviceRepository::new(pool.clone()),
            subscriptions: SubscriptionRepository::new(pool.clone()),
            sellers: SellerRepository::new(pool.clone()),
            commissions: CommissionRepository::new(pool),
        }
    }
}

/// Classify a database error for the earnings pipeline.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::Decode(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

#[async_trait]
impl EarningsStore for PgEarningsStore {
    async fn find_gateways_by_seller(&self, seller_id: Uuid) -> Result<Vec<Gateway>, StoreError> {
        let rows = self
            .gateways
            .find_by_seller(seller_id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_devices_by_gateways(
        &self,
        gateway_ids: &[Uuid],
    ) -> Result<Vec<Device>, StoreError> {
        let rows = self
            .devices
            .find_by_gateways(gateway_ids)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_completed_subscriptions(
        &self,
        device_ids: &[String],
        window: MonthWindow,
    ) -> Result<Vec<Subscription>, StoreError> {
        let rows = self
            .subscriptions
            .find_completed_in_window(device_ids, window.start, window.end)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_seller(&self, seller_id: Uuid) -> Result<Option<Seller>, StoreError> {
        let row = self
            .sellers
            .find_by_id(seller_id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_active_commission_rate(&self) -> Result<Option<Decimal>, StoreError> {
        let row = self
            .commissions
            .find_active()
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(|r| r.rate))
    }

    async fn find_approved_seller_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        self.sellers
            .find_approved_ids()
            .await
            .map_err(map_sqlx_error)
    }
}
