// Domain models shared by parsing, correlation and exposition

mod aggregate;
mod identity;
mod job;
mod sample;

pub use aggregate::{CorrelationStats, FamilyAggregates, JobKey, ProcessKey};
pub use identity::{GroupMap, GroupRecord, UserMap, UserRecord};
pub use job::JobRecord;
pub use sample::{ClassifiedSample, MetricFamily, RawSample};
