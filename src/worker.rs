// Background scrape loop, used when scrape.interval_secs is configured.

use std::sync::Arc;

use tokio::time::{Duration, interval};
use tracing::Instrument;

use crate::coordinator::{ScrapeCoordinator, ScrapeOutcome};
use crate::source::ScrapeSource;

pub struct WorkerConfig {
    pub interval_secs: u64,
}

pub fn spawn<S: ScrapeSource>(
    coordinator: Arc<ScrapeCoordinator<S>>,
    config: WorkerConfig,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    let span = tracing::debug_span!("scrape_worker", interval_secs = config.interval_secs);
    tokio::spawn(run(coordinator, config, shutdown_rx).instrument(span))
}

async fn run<S: ScrapeSource>(
    coordinator: Arc<ScrapeCoordinator<S>>,
    config: WorkerConfig,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    let mut tick = interval(Duration::from_secs(config.interval_secs));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut scrapes_total: u64 = 0;
    let mut scrapes_failed: u64 = 0;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                match coordinator.scrape().await {
                    ScrapeOutcome::Completed(report) => {
                        scrapes_total += 1;
                        if !report.ok {
                            scrapes_failed += 1;
                        }
                        tracing::debug!(
                            operation = "scrape",
                            ok = report.ok,
                            scrapes_total,
                            scrapes_failed,
                            "background scrape finished"
                        );
                    }
                    ScrapeOutcome::Skipped => {
                        tracing::warn!(operation = "scrape", "background scrape skipped");
                    }
                }
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("Scrape worker shutting down");
                break;
            }
        }
    }
}
