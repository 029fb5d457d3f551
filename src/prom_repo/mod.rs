// Lustre jobstats series from the Prometheus HTTP query API

mod parse;

pub use parse::parse_query_response;

use std::time::Duration;

use tracing::instrument;
use url::Url;

use crate::error::ScrapeError;
use crate::models::{MetricFamily, RawSample};

const TIME_RANGE_PLACEHOLDER: &str = "__TIME_RANGE__";

const QUERY_METADATA_OPERATIONS: &str =
    "round(sum by(target,jobid)(irate(lustre_job_stats_total[__TIME_RANGE__])>=1))";
const QUERY_JOB_READ_BYTES: &str =
    "sum by(jobid)(irate(lustre_job_read_bytes_total[__TIME_RANGE__])!=0)";
const QUERY_JOB_WRITE_BYTES: &str =
    "sum by(jobid)(irate(lustre_job_write_bytes_total[__TIME_RANGE__])!=0)";

/// PromQL expression for a family with the rate window filled in.
pub fn family_query(family: MetricFamily, time_range: &str) -> String {
    let template = match family {
        MetricFamily::MetadataOperations => QUERY_METADATA_OPERATIONS,
        MetricFamily::ReadThroughput => QUERY_JOB_READ_BYTES,
        MetricFamily::WriteThroughput => QUERY_JOB_WRITE_BYTES,
    };
    template.replacen(TIME_RANGE_PLACEHOLDER, time_range, 1)
}

/// `{server}/api/v1/query`, keeping any path prefix of the server URL.
pub fn query_endpoint(server: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(server)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("prometheus server URL cannot be a base: {}", server))?
        .pop_if_empty()
        .extend(["api", "v1", "query"]);
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct PromRepo {
    client: reqwest::Client,
    endpoint: Url,
    time_range: String,
}

impl PromRepo {
    pub fn new(server: &str, time_range: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::version::user_agent())
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: query_endpoint(server)?,
            time_range: time_range.to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[instrument(skip(self), fields(repo = "prometheus", operation = "query_family"))]
    pub async fn query_family(&self, family: MetricFamily) -> Result<Vec<RawSample>, ScrapeError> {
        let query = family_query(family, &self.time_range);
        tracing::debug!(endpoint = %self.endpoint, %query, "querying prometheus");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("query", query.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        tracing::trace!(http_status = %status, bytes = body.len(), "prometheus response received");

        let samples = parse_query_response(family, &body)?;
        tracing::debug!(%family, samples = samples.len(), "lustre jobstats parsed");
        Ok(samples)
    }
}
