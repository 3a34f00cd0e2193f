//! Database entity definitions.
//!
//! Entities map directly to database rows and are converted to domain models.

pub mod commission;
pub mod device;
pub mod gateway;
pub mod seller;
pub mod subscription;

pub use commission::CommissionRateEntity;
pub use device::DeviceEntity;
pub use gateway::GatewayEntity;
pub use seller::SellerEntity;
pub use subscription::SubscriptionEntity;
