// SquidViz - benchmark metrics for pull requests
// Library behind the `sv` binary: report store, publisher and command layer

pub mod cli;
pub mod config;
pub mod http;
pub mod metrics;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{ConfigSources, FlagOverrides, SquidVizConfig};
pub use http::{PublishError, PublishOutcome, Publisher, TemplateError, UrlTemplate};
pub use metrics::{Magnitude, Metric, PullRequest, Report, ReportStore, StoreError};
pub use telemetry::init_telemetry;
