// Prometheus registry holding every exported gauge family

use std::collections::BTreeMap;

use prometheus::core::Collector;
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

use crate::coordinator::ScrapeReport;
use crate::models::MetricFamily;

pub const NAMESPACE: &str = "cluster";
pub const NAMESPACE_INTERNALS: &str = "cluster_exporter";

const JOB_LABELS: &[&str] = &["account", "user"];
const JOB_TARGET_LABELS: &[&str] = &["account", "user", "target"];
const PROC_LABELS: &[&str] = &["proc_name", "group_name", "user_name"];
const PROC_TARGET_LABELS: &[&str] = &["proc_name", "group_name", "user_name", "target"];

/// Job and process gauge vectors of one metric family.
#[derive(Clone)]
struct FamilyGauges {
    job: GaugeVec,
    proc: GaugeVec,
}

#[derive(Clone)]
pub struct ExporterMetrics {
    registry: Registry,
    scrape_ok: Gauge,
    stage_execution: GaugeVec,
    families: BTreeMap<MetricFamily, FamilyGauges>,
}

fn gauge_vec(namespace: &str, name: &str, help: &str, labels: &[&str]) -> prometheus::Result<GaugeVec> {
    GaugeVec::new(Opts::new(name, help).namespace(namespace), labels)
}

fn family_gauges(family: MetricFamily) -> prometheus::Result<FamilyGauges> {
    let gauges = match family {
        MetricFamily::MetadataOperations => FamilyGauges {
            job: gauge_vec(
                NAMESPACE,
                "job_metadata_operations",
                "Total metadata operations of all jobs on the cluster per account, user and MDT.",
                JOB_TARGET_LABELS,
            )?,
            proc: gauge_vec(
                NAMESPACE,
                "proc_metadata_operations",
                "Total metadata operations of process names on the cluster per group, user and MDT.",
                PROC_TARGET_LABELS,
            )?,
        },
        MetricFamily::ReadThroughput => FamilyGauges {
            job: gauge_vec(
                NAMESPACE,
                "job_read_throughput_bytes",
                "Total IO read throughput of all jobs on the cluster per account and user in bytes per second.",
                JOB_LABELS,
            )?,
            proc: gauge_vec(
                NAMESPACE,
                "proc_read_throughput_bytes",
                "Total IO read throughput of process names on the cluster per group and user in bytes per second.",
                PROC_LABELS,
            )?,
        },
        MetricFamily::WriteThroughput => FamilyGauges {
            job: gauge_vec(
                NAMESPACE,
                "job_write_throughput_bytes",
                "Total IO write throughput of all jobs on the cluster per account and user in bytes per second.",
                JOB_LABELS,
            )?,
            proc: gauge_vec(
                NAMESPACE,
                "proc_write_throughput_bytes",
                "Total IO write throughput of process names on the cluster per group and user in bytes per second.",
                PROC_LABELS,
            )?,
        },
    };
    Ok(gauges)
}

fn scrape_ok_gauge() -> prometheus::Result<Gauge> {
    Gauge::with_opts(
        Opts::new(
            "scrape_ok",
            "Indicates if the scrape of the exporter was successful or not.",
        )
        .namespace(NAMESPACE_INTERNALS),
    )
}

impl ExporterMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let scrape_ok = scrape_ok_gauge()?;
        registry.register(Box::new(scrape_ok.clone()))?;

        let stage_execution = gauge_vec(
            NAMESPACE_INTERNALS,
            "stage_execution_seconds",
            "Execution duration in seconds spend in a specific exporter stage.",
            &["name"],
        )?;
        registry.register(Box::new(stage_execution.clone()))?;

        let mut families = BTreeMap::new();
        for family in MetricFamily::ALL {
            let gauges = family_gauges(family)?;
            registry.register(Box::new(gauges.job.clone()))?;
            registry.register(Box::new(gauges.proc.clone()))?;
            families.insert(family, gauges);
        }

        Ok(Self {
            registry,
            scrape_ok,
            stage_execution,
            families,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn set_scrape_ok(&self, ok: bool) {
        self.scrape_ok.set(if ok { 1.0 } else { 0.0 });
    }

    /// Replace every per-cycle gauge with the results of one completed scrape.
    /// Families missing from the report stay empty.
    pub fn publish(&self, report: &ScrapeReport) {
        self.stage_execution.reset();
        for gauges in self.families.values() {
            gauges.job.reset();
            gauges.proc.reset();
        }

        for stage in &report.stages {
            self.stage_execution
                .with_label_values(&[stage.name])
                .set(stage.elapsed.as_secs_f64());
        }

        for (family, aggregates) in &report.families {
            let Some(gauges) = self.families.get(family) else {
                continue;
            };
            for (key, value) in &aggregates.jobs {
                match &key.target {
                    Some(target) => gauges
                        .job
                        .with_label_values(&[key.account.as_str(), key.user.as_str(), target.as_str()])
                        .set(*value),
                    None => gauges
                        .job
                        .with_label_values(&[key.account.as_str(), key.user.as_str()])
                        .set(*value),
                }
            }
            for (key, value) in &aggregates.processes {
                match &key.target {
                    Some(target) => gauges
                        .proc
                        .with_label_values(&[
                            key.proc_name.as_str(),
                            key.group_name.as_str(),
                            key.user_name.as_str(),
                            target.as_str(),
                        ])
                        .set(*value),
                    None => gauges
                        .proc
                        .with_label_values(&[
                            key.proc_name.as_str(),
                            key.group_name.as_str(),
                            key.user_name.as_str(),
                        ])
                        .set(*value),
                }
            }
        }

        self.set_scrape_ok(report.ok);
    }

    /// Text exposition of the whole registry.
    pub fn encode(&self) -> prometheus::Result<String> {
        encode_families(&self.registry.gather())
    }

    /// Exposition for a skipped scrape: a standalone `scrape_ok 0`, leaving
    /// the registry to the cycle that is still running.
    pub fn encode_skipped(&self) -> prometheus::Result<String> {
        let scrape_ok = scrape_ok_gauge()?;
        scrape_ok.set(0.0);
        encode_families(&scrape_ok.collect())
    }
}

fn encode_families(families: &[prometheus::proto::MetricFamily]) -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
