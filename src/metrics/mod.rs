// Metric recording
// The report data model and the on-disk store that appends to it

pub mod storage;
pub mod types;

pub use storage::{ReportStore, StoreError};
pub use types::{Magnitude, Metric, PullRequest, Report};
