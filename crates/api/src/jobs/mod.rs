//! Background job scheduler and job implementations.

mod pool_metrics;
mod reconciliation;
mod scheduler;

pub use pool_metrics::PoolMetricsJob;
pub use reconciliation::{ReconciliationJob, ReconciliationReport};
pub use scheduler::{run_job, Job, JobError, JobScheduler};
