//! Repository implementations for database operations.

pub mod commission;
pub mod device;
pub mod gateway;
pub mod seller;
pub mod subscription;

pub use commission::CommissionRepository;
pub use device::DeviceRepository;
pub use gateway::GatewayRepository;
pub use seller::SellerRepository;
pub use subscription::SubscriptionRepository;
