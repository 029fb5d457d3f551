// Shared test helpers: identity fixtures and an in-memory ScrapeSource

#![allow(dead_code)]

use cluster_exporter::error::ScrapeError;
use cluster_exporter::identity::{parse_groups, parse_users};
use cluster_exporter::models::*;
use cluster_exporter::source::ScrapeSource;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

pub const METADATA_FIXTURE: &str = include_str!("../fixtures/metadata_operations.json");

pub const PASSWD: &str = "\
root:x:0:0:root:/root:/bin/bash
sftp:x:5524:500::/srv/sftp:/sbin/nologin
alice:x:6812:500:Alice:/home/alice:/bin/bash
reloader:x:7377:501::/var/lib/reloader:/sbin/nologin
bob:x:9334:501:Bob:/home/bob:/bin/zsh
slurm:x:10388:502::/var/lib/slurm:/sbin/nologin
";

pub const GROUP: &str = "\
root:x:0:
hpc:x:500:alice
lustre:x:501:bob
slurm:x:502:
";

pub fn users() -> UserMap {
    parse_users(PASSWD).expect("passwd fixture")
}

pub fn groups() -> GroupMap {
    parse_groups(GROUP).expect("group fixture")
}

pub fn jobs() -> Vec<JobRecord> {
    vec![
        JobRecord::new("100", "physics", "alice"),
        JobRecord::new("200", "chem", "bob"),
        JobRecord::new("300", "physics", "alice"),
    ]
}

/// In-memory source. `None` tables fail acquisition; families without an
/// entry in `samples` return an empty result set.
pub struct FakeSource {
    pub jobs: Option<Vec<JobRecord>>,
    pub users: Option<UserMap>,
    pub groups: Option<GroupMap>,
    pub samples: HashMap<MetricFamily, Result<Vec<RawSample>, String>>,
    /// When set, `running_jobs` waits for one notification before returning.
    pub gate: Option<Arc<Notify>>,
    pub sample_calls: AtomicUsize,
}

impl FakeSource {
    pub fn healthy() -> Self {
        Self {
            jobs: Some(jobs()),
            users: Some(users()),
            groups: Some(groups()),
            samples: HashMap::new(),
            gate: None,
            sample_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_samples(mut self, family: MetricFamily, samples: Vec<RawSample>) -> Self {
        self.samples.insert(family, Ok(samples));
        self
    }

    pub fn with_failing_query(mut self, family: MetricFamily, status: &str) -> Self {
        self.samples.insert(family, Err(status.to_string()));
        self
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

fn unavailable(origin: &'static str) -> ScrapeError {
    ScrapeError::Acquisition {
        origin,
        reason: "unavailable in test".into(),
    }
}

impl ScrapeSource for FakeSource {
    async fn running_jobs(&self) -> Result<Vec<JobRecord>, ScrapeError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.jobs.clone().ok_or_else(|| unavailable("job queue"))
    }

    async fn users(&self) -> Result<UserMap, ScrapeError> {
        self.users.clone().ok_or_else(|| unavailable("user identities"))
    }

    async fn groups(&self) -> Result<GroupMap, ScrapeError> {
        self.groups.clone().ok_or_else(|| unavailable("group identities"))
    }

    async fn samples(&self, family: MetricFamily) -> Result<Vec<RawSample>, ScrapeError> {
        self.sample_calls.fetch_add(1, Ordering::SeqCst);
        match self.samples.get(&family) {
            Some(Ok(samples)) => Ok(samples.clone()),
            Some(Err(status)) => Err(ScrapeError::QueryStatus(status.clone())),
            None => Ok(Vec::new()),
        }
    }
}
