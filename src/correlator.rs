// Joins classified samples against the job and identity tables and sums them
// into per-family aggregates.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::classifier::classify;
use crate::error::{Input, ScrapeError};
use crate::models::{
    ClassifiedSample, CorrelationStats, FamilyAggregates, GroupMap, JobKey, JobRecord,
    MetricFamily, ProcessKey, RawSample, UserMap,
};

/// Metadata targets end in `MDT` plus four hex digits, e.g. `hebe-MDT0002`.
static MDT_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"MDT[0-9a-fA-F]{4}$").expect("valid MDT target regex"));

pub fn is_mdt_target(target: &str) -> bool {
    MDT_TARGET.is_match(target)
}

/// What to do with a sample whose key cannot be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationPolicy {
    /// Log a warning and continue with the next sample.
    Skip,
    /// Fail the whole correlation pass.
    Fail,
}

#[derive(Debug, Clone, Copy)]
pub struct CorrelatorConfig {
    pub metadata_policy: ClassificationPolicy,
    pub throughput_policy: ClassificationPolicy,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            metadata_policy: ClassificationPolicy::Skip,
            throughput_policy: ClassificationPolicy::Fail,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationOutcome {
    pub aggregates: FamilyAggregates,
    pub stats: CorrelationStats,
}

#[derive(Debug, Clone, Default)]
pub struct Correlator {
    config: CorrelatorConfig,
}

impl Correlator {
    pub fn new(config: CorrelatorConfig) -> Self {
        Self { config }
    }

    pub fn policy(&self, family: MetricFamily) -> ClassificationPolicy {
        if family.has_target() {
            self.config.metadata_policy
        } else {
            self.config.throughput_policy
        }
    }

    /// Correlation needs running jobs and both identity tables.
    pub fn check_inputs(
        jobs: &[JobRecord],
        users: &UserMap,
        groups: &GroupMap,
    ) -> Result<(), ScrapeError> {
        if jobs.is_empty() {
            return Err(ScrapeError::MissingInput(Input::Jobs));
        }
        if users.is_empty() {
            return Err(ScrapeError::MissingInput(Input::Users));
        }
        if groups.is_empty() {
            return Err(ScrapeError::MissingInput(Input::Groups));
        }
        Ok(())
    }

    /// Correlate one family's samples. On error nothing is returned, so a
    /// failed pass never exposes a partially filled table.
    pub fn correlate(
        &self,
        family: MetricFamily,
        samples: &[RawSample],
        jobs: &[JobRecord],
        users: &UserMap,
        groups: &GroupMap,
    ) -> Result<CorrelationOutcome, ScrapeError> {
        Self::check_inputs(jobs, users, groups)?;

        let policy = self.policy(family);
        let mut out = CorrelationOutcome::default();
        out.stats.received = samples.len();

        for sample in samples {
            let target = if family.has_target() {
                match sample.target.as_deref() {
                    Some(t) if is_mdt_target(t) => Some(t.to_string()),
                    other => {
                        tracing::debug!(
                            %family,
                            key = %sample.key,
                            target = ?other,
                            "dropping sample for non-MDT target"
                        );
                        out.stats.filtered += 1;
                        continue;
                    }
                }
            } else {
                None
            };

            let classified = match classify(&sample.key) {
                Ok(c) => c,
                Err(e) if policy == ClassificationPolicy::Skip => {
                    tracing::warn!(%family, error = %e, "skipping unclassifiable sample");
                    out.stats.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match classified {
                ClassifiedSample::Job { job_id } => {
                    let mut matched = false;
                    for job in jobs.iter().filter(|j| j.job_id == job_id) {
                        matched = true;
                        out.aggregates.add_job(
                            JobKey {
                                account: job.account.clone(),
                                user: job.user.clone(),
                                target: target.clone(),
                            },
                            sample.value,
                        );
                    }
                    if !matched {
                        out.stats.unmatched_jobs += 1;
                    }
                }
                ClassifiedSample::Process { proc_name, uid } => {
                    let user = u32::try_from(uid)
                        .ok()
                        .and_then(|uid| users.get(&uid))
                        .ok_or(ScrapeError::UnknownUid(uid))?;
                    let group = groups
                        .get(&user.gid)
                        .ok_or(ScrapeError::UnknownGid(user.gid))?;
                    out.aggregates.add_process(
                        ProcessKey {
                            proc_name,
                            group_name: group.name.clone(),
                            user_name: user.name.clone(),
                            target,
                        },
                        sample.value,
                    );
                }
            }
        }

        tracing::debug!(
            %family,
            received = out.stats.received,
            filtered = out.stats.filtered,
            skipped = out.stats.skipped,
            unmatched_jobs = out.stats.unmatched_jobs,
            label_sets = out.aggregates.len(),
            "correlation pass finished"
        );
        Ok(out)
    }
}
