use anyhow::Result;
use cluster_exporter::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = config::AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&app_config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let source = source::ClusterSource {
        commands: command_repo::CommandRepo::new(
            app_config.commands.squeue.as_str(),
            app_config.commands.getent.as_str(),
            Duration::from_secs(app_config.commands.timeout_secs),
        ),
        prom: prom_repo::PromRepo::new(
            &app_config.prometheus.server,
            &app_config.prometheus.time_range,
            Duration::from_secs(app_config.prometheus.request_timeout_secs),
        )?,
    };
    tracing::info!(endpoint = %source.prom.endpoint(), "Prometheus query endpoint");

    let coordinator = Arc::new(coordinator::ScrapeCoordinator::new(
        source,
        correlator::Correlator::new(app_config.scrape.correlator_config()),
        metrics::ExporterMetrics::new()?,
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let worker_handle = app_config.scrape.interval_secs.map(|interval_secs| {
        worker::spawn(
            coordinator.clone(),
            worker::WorkerConfig { interval_secs },
            shutdown_rx,
        )
    });

    let app = routes::app(coordinator, worker_handle.is_none());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(version = version::VERSION, "Exporter listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    if let Some(handle) = worker_handle {
        let _ = handle.await;
    }
    tracing::info!("Exporter finished");
    Ok(())
}
