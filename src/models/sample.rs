// Raw query-engine samples and their classification

use std::fmt;

/// Output metric family sourced from the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricFamily {
    MetadataOperations,
    ReadThroughput,
    WriteThroughput,
}

impl MetricFamily {
    /// Correlation passes run in this order.
    pub const ALL: [MetricFamily; 3] = [
        MetricFamily::MetadataOperations,
        MetricFamily::ReadThroughput,
        MetricFamily::WriteThroughput,
    ];

    /// Metadata samples carry the storage target they were issued against.
    pub fn has_target(self) -> bool {
        matches!(self, MetricFamily::MetadataOperations)
    }

    /// Name of the timing stage covering fetch + correlation of this family.
    pub fn stage_name(self) -> &'static str {
        match self {
            MetricFamily::MetadataOperations => "build_metadata_operations_metrics",
            MetricFamily::ReadThroughput => "build_read_throughput_metrics",
            MetricFamily::WriteThroughput => "build_write_throughput_metrics",
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetricFamily::MetadataOperations => "metadata_operations",
            MetricFamily::ReadThroughput => "read_throughput",
            MetricFamily::WriteThroughput => "write_throughput",
        };
        f.write_str(s)
    }
}

/// One entry of a query-engine result set.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// Either a bare job id or `<proc_name>.<uid>`.
    pub key: String,
    pub target: Option<String>,
    pub value: f64,
}

impl RawSample {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            target: None,
            value,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedSample {
    Job { job_id: String },
    /// `uid` is kept as parsed; values outside the uid range resolve to no user.
    Process { proc_name: String, uid: i64 },
}
