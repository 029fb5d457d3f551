// Per-family aggregate tables. Keys are explicit label tuples.

use std::collections::BTreeMap;

/// Label set of the job-class gauges.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobKey {
    pub account: String,
    pub user: String,
    pub target: Option<String>,
}

/// Label set of the process-class gauges.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessKey {
    pub proc_name: String,
    pub group_name: String,
    pub user_name: String,
    pub target: Option<String>,
}

/// Summed values for one metric family within one scrape cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyAggregates {
    pub jobs: BTreeMap<JobKey, f64>,
    pub processes: BTreeMap<ProcessKey, f64>,
}

impl FamilyAggregates {
    pub fn add_job(&mut self, key: JobKey, value: f64) {
        *self.jobs.entry(key).or_insert(0.0) += value;
    }

    pub fn add_process(&mut self, key: ProcessKey, value: f64) {
        *self.processes.entry(key).or_insert(0.0) += value;
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty() && self.processes.is_empty()
    }

    /// Number of distinct label sets.
    pub fn len(&self) -> usize {
        self.jobs.len() + self.processes.len()
    }

    pub fn total(&self) -> f64 {
        self.jobs.values().sum::<f64>() + self.processes.values().sum::<f64>()
    }
}

/// Counters of one correlation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelationStats {
    pub received: usize,
    /// Dropped by the metadata target filter.
    pub filtered: usize,
    /// Skipped because the key could not be classified.
    pub skipped: usize,
    /// Job samples whose id matched no running job.
    pub unmatched_jobs: usize,
}
