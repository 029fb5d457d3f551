// Integration tests: HTTP endpoints over an in-memory source

mod common;

use axum_test::TestServer;
use cluster_exporter::coordinator::ScrapeCoordinator;
use cluster_exporter::correlator::Correlator;
use cluster_exporter::metrics::ExporterMetrics;
use cluster_exporter::models::*;
use cluster_exporter::routes;
use common::FakeSource;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::Notify;

fn test_coordinator(source: FakeSource) -> Arc<ScrapeCoordinator<FakeSource>> {
    Arc::new(ScrapeCoordinator::new(
        source,
        Correlator::default(),
        ExporterMetrics::new().expect("metrics"),
    ))
}

fn busy_source() -> FakeSource {
    FakeSource::healthy()
        .with_samples(
            MetricFamily::MetadataOperations,
            vec![
                RawSample::new("100", 40.0).with_target("hebe-MDT0000"),
                RawSample::new("ls.6812", 7.0).with_target("hebe-MDT0001"),
            ],
        )
        .with_samples(
            MetricFamily::ReadThroughput,
            vec![RawSample::new("200", 2048.0)],
        )
}

#[tokio::test]
async fn test_root_endpoint() {
    let app = routes::app(test_coordinator(FakeSource::healthy()), true);
    let server = TestServer::new(app);
    let response = server.get("/").await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("Cluster Exporter"));
    assert!(text.contains("href='/metrics'"));
}

#[tokio::test]
async fn test_version_endpoint() {
    let app = routes::app(test_coordinator(FakeSource::healthy()), true);
    let server = TestServer::new(app);
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(
        json.get("name").and_then(|v| v.as_str()),
        Some("cluster-exporter")
    );
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_metrics_endpoint_scrapes_on_demand() {
    let coordinator = test_coordinator(busy_source());
    let app = routes::app(coordinator.clone(), true);
    let server = TestServer::new(app);

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    let content_type = response.header("content-type");
    assert!(content_type.to_str().unwrap().starts_with("text/plain"));

    let text = response.text();
    assert!(text.contains("cluster_exporter_scrape_ok 1"));
    let job_line = text
        .lines()
        .find(|l| l.starts_with("cluster_job_metadata_operations{"))
        .expect("job metadata line");
    assert!(job_line.contains(r#"account="physics""#));
    assert!(job_line.contains(r#"target="hebe-MDT0000""#));
    assert!(job_line.ends_with(" 40"));
    assert!(text.contains("cluster_proc_metadata_operations{"));
    assert!(text.contains(r#"proc_name="ls""#));
    assert!(text.contains(r#"cluster_job_read_throughput_bytes{account="chem",user="bob"} 2048"#));
    assert!(text.contains(r#"name="retrieve_running_jobs""#));
    assert_eq!(coordinator.source().sample_calls.load(Ordering::SeqCst), 3);

    server.get("/metrics").await.assert_status_ok();
    assert_eq!(coordinator.source().sample_calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_metrics_endpoint_reports_failed_scrape() {
    let mut source = busy_source();
    source.groups = None;
    let app = routes::app(test_coordinator(source), true);
    let server = TestServer::new(app);

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("cluster_exporter_scrape_ok 0"));
    assert!(!text.contains("cluster_job_metadata_operations{"));
}

#[tokio::test]
async fn test_metrics_endpoint_background_mode_does_not_scrape() {
    let coordinator = test_coordinator(busy_source());
    let app = routes::app(coordinator.clone(), false);
    let server = TestServer::new(app);

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    assert!(response.text().contains("cluster_exporter_scrape_ok 0"));
    assert_eq!(coordinator.source().sample_calls.load(Ordering::SeqCst), 0);

    coordinator.scrape().await;
    let text = server.get("/metrics").await.text();
    assert!(text.contains("cluster_exporter_scrape_ok 1"));
    assert_eq!(coordinator.source().sample_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_metrics_endpoint_overlapping_request_reports_skip() {
    let gate = Arc::new(Notify::new());
    let coordinator = test_coordinator(busy_source().with_gate(gate.clone()));

    let running = {
        let c = coordinator.clone();
        tokio::spawn(async move { c.scrape().await })
    };
    while !coordinator.is_active() {
        tokio::task::yield_now().await;
    }

    let app = routes::app(coordinator.clone(), true);
    let server = TestServer::new(app);
    let response = tokio::time::timeout(Duration::from_secs(5), server.get("/metrics"))
        .await
        .expect("overlapping request must not wait for the running scrape");
    response.assert_status_ok();
    assert!(response.text().contains("cluster_exporter_scrape_ok 0"));

    gate.notify_one();
    running.await.unwrap();
    assert!(!coordinator.is_active());
}

#[tokio::test]
async fn test_metrics_endpoint_dropped_request_still_publishes() {
    let gate = Arc::new(Notify::new());
    let coordinator = test_coordinator(busy_source().with_gate(gate.clone()));
    let app = routes::app(coordinator.clone(), true);
    let server = TestServer::new(app);

    // Client gives up while the cycle is blocked on the job queue.
    let dropped = tokio::time::timeout(Duration::from_millis(50), server.get("/metrics")).await;
    assert!(dropped.is_err());
    assert!(coordinator.is_active());

    gate.notify_one();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while coordinator.is_active() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "scrape did not finish after the request was dropped"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let text = coordinator.metrics().encode().unwrap();
    assert!(text.contains("cluster_exporter_scrape_ok 1"));
    assert!(text.contains(r#"name="build_write_throughput_metrics""#));
    assert!(text.contains(r#"cluster_job_read_throughput_bytes{account="chem",user="bob"} 2048"#));
    assert_eq!(coordinator.source().sample_calls.load(Ordering::SeqCst), 3);
}
