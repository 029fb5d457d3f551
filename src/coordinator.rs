// One scrape cycle: single-flight guard, concurrent acquisition, one timed
// correlation pass per metric family, publication into the registry.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::correlator::{CorrelationOutcome, Correlator};
use crate::error::ScrapeError;
use crate::metrics::ExporterMetrics;
use crate::models::{FamilyAggregates, GroupMap, JobRecord, MetricFamily, UserMap};
use crate::source::ScrapeSource;

pub const STAGE_RETRIEVE_RUNNING_JOBS: &str = "retrieve_running_jobs";
pub const STAGE_RETRIEVE_USERS: &str = "retrieve_user_name_info";
pub const STAGE_RETRIEVE_GROUPS: &str = "retrieve_group_name_info";

#[derive(Debug, Clone, PartialEq)]
pub struct StageTiming {
    pub name: &'static str,
    pub elapsed: Duration,
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeReport {
    /// AND over every stage.
    pub ok: bool,
    pub stages: Vec<StageTiming>,
    /// Only families whose pass succeeded.
    pub families: BTreeMap<MetricFamily, FamilyAggregates>,
}

impl ScrapeReport {
    pub fn stage(&self, name: &str) -> Option<&StageTiming> {
        self.stages.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Completed(ScrapeReport),
    /// Another cycle was active; nothing was done.
    Skipped,
}

/// Clears the active flag when the cycle ends, however it ends.
struct ActiveGuard<'a>(&'a Mutex<bool>);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

pub struct ScrapeCoordinator<S> {
    source: S,
    correlator: Correlator,
    metrics: ExporterMetrics,
    active: Mutex<bool>,
}

async fn timed<T>(fut: impl Future<Output = T>) -> (Duration, T) {
    let start = Instant::now();
    let out = fut.await;
    (start.elapsed(), out)
}

/// Record a stage and hand back its value if it succeeded.
fn record<T>(
    stages: &mut Vec<StageTiming>,
    name: &'static str,
    (elapsed, result): (Duration, Result<T, ScrapeError>),
) -> Option<T> {
    stages.push(StageTiming {
        name,
        elapsed,
        ok: result.is_ok(),
    });
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(stage = name, error = %e, "scrape stage failed");
            None
        }
    }
}

impl<S: ScrapeSource> ScrapeCoordinator<S> {
    pub fn new(source: S, correlator: Correlator, metrics: ExporterMetrics) -> Self {
        Self {
            source,
            correlator,
            metrics,
            active: Mutex::new(false),
        }
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.metrics
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_active(&self) -> bool {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Test-and-set of the active flag. The lock is not held past this call.
    fn try_activate(&self) -> Option<ActiveGuard<'_>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if *active {
            return None;
        }
        *active = true;
        Some(ActiveGuard(&self.active))
    }

    /// Run one scrape cycle unless one is already running. Never blocks on
    /// a running cycle.
    pub async fn scrape(&self) -> ScrapeOutcome {
        let Some(guard) = self.try_activate() else {
            tracing::warn!("scrape is still active, skipping");
            return ScrapeOutcome::Skipped;
        };
        tracing::debug!("scrape started");

        let report = self.run_cycle().await;
        self.metrics.publish(&report);
        drop(guard);

        tracing::debug!(
            ok = report.ok,
            families = report.families.len(),
            "scrape finished"
        );
        ScrapeOutcome::Completed(report)
    }

    async fn run_cycle(&self) -> ScrapeReport {
        let mut stages = Vec::with_capacity(3 + MetricFamily::ALL.len());

        let (jobs, users, groups) = tokio::join!(
            timed(self.source.running_jobs()),
            timed(self.source.users()),
            timed(self.source.groups()),
        );
        let jobs = record(&mut stages, STAGE_RETRIEVE_RUNNING_JOBS, jobs).unwrap_or_default();
        let users = record(&mut stages, STAGE_RETRIEVE_USERS, users).unwrap_or_default();
        let groups = record(&mut stages, STAGE_RETRIEVE_GROUPS, groups).unwrap_or_default();

        let mut families = BTreeMap::new();
        for family in MetricFamily::ALL {
            let pass = timed(self.correlate_family(family, &jobs, &users, &groups)).await;
            if let Some(outcome) = record(&mut stages, family.stage_name(), pass) {
                families.insert(family, outcome.aggregates);
            }
        }

        let ok = stages.iter().all(|s| s.ok);
        ScrapeReport {
            ok,
            stages,
            families,
        }
    }

    async fn correlate_family(
        &self,
        family: MetricFamily,
        jobs: &[JobRecord],
        users: &UserMap,
        groups: &GroupMap,
    ) -> Result<CorrelationOutcome, ScrapeError> {
        // No query when the pass could not be correlated anyway.
        Correlator::check_inputs(jobs, users, groups)?;
        let samples = self.source.samples(family).await?;
        self.correlator
            .correlate(family, &samples, jobs, users, groups)
    }
}
