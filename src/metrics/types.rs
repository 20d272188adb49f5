use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A single labeled measurement as stored in the report file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: f64,
    /// Unit or free-form type tag. May be empty.
    #[serde(rename = "type")]
    pub metric_type: String,
}

impl Metric {
    pub fn new(label: impl Into<String>, value: f64, metric_type: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            metric_type: metric_type.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(rename = "data")]
    pub metrics: Vec<Metric>,
}

/// On-disk aggregate of every metric recorded for one pull request.
///
/// Metrics are kept in append order; nothing is ever reordered or deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub pull_request: PullRequest,
}

impl Report {
    pub fn push(&mut self, metric: Metric) {
        self.pull_request.metrics.push(metric);
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.pull_request.metrics
    }
}

/// Unit used by `sv time` to express an elapsed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Magnitude {
    Seconds,
    Milliseconds,
    Nanoseconds,
}

impl Magnitude {
    pub const ACCEPTED: &'static [&'static str] = &[
        "s",
        "seconds",
        "ms",
        "milliseconds",
        "ns",
        "nanosecond",
        "nanoseconds",
    ];

    /// Name written to the metric's `type` field
    pub fn unit_name(self) -> &'static str {
        match self {
            Magnitude::Seconds => "seconds",
            Magnitude::Milliseconds => "milliseconds",
            Magnitude::Nanoseconds => "nanoseconds",
        }
    }

    /// Express `elapsed` in this unit.
    ///
    /// Seconds keep their fractional part; milliseconds and nanoseconds are
    /// whole counts, so sub-unit precision is dropped.
    pub fn measure(self, elapsed: Duration) -> f64 {
        match self {
            Magnitude::Seconds => elapsed.as_secs_f64(),
            Magnitude::Milliseconds => elapsed.as_millis() as f64,
            Magnitude::Nanoseconds => elapsed.as_nanos() as f64,
        }
    }
}

impl FromStr for Magnitude {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" | "seconds" => Ok(Magnitude::Seconds),
            "ms" | "milliseconds" => Ok(Magnitude::Milliseconds),
            "ns" | "nanosecond" | "nanoseconds" => Ok(Magnitude::Nanoseconds),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.unit_name())
    }
}
