// Query API JSON -> RawSample

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ScrapeError;
use crate::models::{MetricFamily, RawSample};

const ORIGIN: &str = "prometheus query";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<QueryEntry>,
}

#[derive(Debug, Deserialize)]
struct QueryEntry {
    #[serde(default)]
    metric: HashMap<String, String>,
    /// `[timestamp, "value"]`
    value: (serde_json::Value, String),
}

fn parse_value(family: MetricFamily, raw: &str) -> Result<f64, ScrapeError> {
    let parsed = if family.has_target() {
        raw.parse::<i64>().map(|v| v as f64).map_err(|e| e.to_string())
    } else {
        raw.parse::<f64>().map_err(|e| e.to_string())
    };
    parsed.map_err(|e| ScrapeError::Acquisition {
        origin: ORIGIN,
        reason: format!("invalid {} value {:?}: {}", family, raw, e),
    })
}

/// Parse a vector query response. A non-success status rejects the whole
/// response; entries without a `jobid` label are skipped.
pub fn parse_query_response(
    family: MetricFamily,
    content: &[u8],
) -> Result<Vec<RawSample>, ScrapeError> {
    let response: QueryResponse = serde_json::from_slice(content)?;

    if response.status != "success" {
        let status = match response.error {
            Some(error) => format!("{}: {}", response.status, error),
            None => response.status,
        };
        return Err(ScrapeError::QueryStatus(status));
    }

    let data = response.data.ok_or_else(|| ScrapeError::Acquisition {
        origin: ORIGIN,
        reason: "response has no data section".into(),
    })?;

    let mut samples = Vec::with_capacity(data.result.len());
    for mut entry in data.result {
        let Some(jobid) = entry.metric.remove("jobid") else {
            tracing::warn!(%family, metric = ?entry.metric, "key jobid not found in metric");
            continue;
        };
        let value = parse_value(family, &entry.value.1)?;
        let mut sample = RawSample::new(jobid, value);
        if family.has_target() {
            let target = entry
                .metric
                .remove("target")
                .ok_or_else(|| ScrapeError::Acquisition {
                    origin: ORIGIN,
                    reason: format!("metadata sample {} has no target label", sample.key),
                })?;
            sample = sample.with_target(target);
        }
        samples.push(sample);
    }
    Ok(samples)
}
