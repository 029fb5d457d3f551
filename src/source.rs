// Seam between the scrape coordinator and the external data sources

use std::future::Future;

use crate::command_repo::CommandRepo;
use crate::error::ScrapeError;
use crate::models::{GroupMap, JobRecord, MetricFamily, RawSample, UserMap};
use crate::prom_repo::PromRepo;

/// The external data a scrape cycle consumes. Every call returns a fresh
/// snapshot; nothing is cached between cycles.
pub trait ScrapeSource: Send + Sync + 'static {
    fn running_jobs(&self) -> impl Future<Output = Result<Vec<JobRecord>, ScrapeError>> + Send;

    fn users(&self) -> impl Future<Output = Result<UserMap, ScrapeError>> + Send;

    fn groups(&self) -> impl Future<Output = Result<GroupMap, ScrapeError>> + Send;

    fn samples(
        &self,
        family: MetricFamily,
    ) -> impl Future<Output = Result<Vec<RawSample>, ScrapeError>> + Send;
}

/// squeue + getent + Prometheus.
#[derive(Debug, Clone)]
pub struct ClusterSource {
    pub commands: CommandRepo,
    pub prom: PromRepo,
}

impl ScrapeSource for ClusterSource {
    async fn running_jobs(&self) -> Result<Vec<JobRecord>, ScrapeError> {
        self.commands.running_jobs().await
    }

    async fn users(&self) -> Result<UserMap, ScrapeError> {
        self.commands.users().await
    }

    async fn groups(&self) -> Result<GroupMap, ScrapeError> {
        self.commands.groups().await
    }

    async fn samples(&self, family: MetricFamily) -> Result<Vec<RawSample>, ScrapeError> {
        self.prom.query_family(family).await
    }
}
