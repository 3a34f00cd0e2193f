//! Domain models for the seller portal.

pub mod device;
pub mod earnings;
pub mod gateway;
pub mod query;
pub mod seller;
pub mod subscription;
pub mod topology;

pub use device::Device;
pub use earnings::{
    CommissionPolicy, CommissionSource, DashboardSummary, EarningsSnapshot, FailureKind,
    FailureTag, IntegrityWarning, MonthOption, MonthlyEarningsSummary, PlanDistribution,
    PlanShare, RecentTransaction, SnapshotStatus, DEFAULT_COMMISSION_RATE,
};
pub use gateway::{Gateway, GatewayStatus};
pub use query::{
    BreakdownQuery, MonthOptionsQuery, MonthQuery, DEFAULT_BREAKDOWN_MONTHS, DEFAULT_MONTH_OPTIONS,
};
pub use seller::Seller;
pub use subscription::{PaymentStatus, Subscription};
pub use topology::SellerTopology;
