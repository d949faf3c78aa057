//! Carbon-intensity snapshots with refresh scheduling.
//!
//! The [`services::scheduler::RefreshScheduler`] drives
//! [`services::aggregator::SnapshotAggregator`], which fetches the current
//! reading, the recent history and the power mix for a zone concurrently and
//! merges them into one [`models::snapshot::Snapshot`].

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{Config, ProviderConfig, SchedulerConfig};
pub use models::error::AppError;
pub use models::snapshot::Snapshot;
pub use services::scheduler::RefreshScheduler;
