//! Domain services for the seller portal.
//!
//! Services contain business logic that operates on domain models.

pub mod dashboard;
pub mod earnings;
pub mod export;
pub mod insights;
pub mod notifier;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use dashboard::{DashboardState, EarningsDashboard};
pub use earnings::{
    check_integrity, compute_snapshot, EarningsError, EarningsService,
    DEFAULT_AGGREGATION_TIMEOUT, DEFAULT_RECENT_LIMIT,
};
pub use export::{report_filename, CsvExport, ExportOutcome};
pub use insights::{month_options, plan_display_name};
pub use notifier::{
    ChangeOperation, EarningsNotifier, LiveEvent, NotifierError, SubscriptionChange,
    SubscriptionHandle, DEFAULT_CHANNEL_CAPACITY,
};
pub use store::{EarningsStore, MemoryEarningsStore, StoreError};
