// GET handlers: metrics, index, version

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};

use super::{AppState, METRICS_PATH};
use crate::coordinator::ScrapeOutcome;
use crate::source::ScrapeSource;
use crate::version::{NAME, VERSION};

/// GET /metrics: Prometheus text exposition. Runs a scrape first in on-demand mode.
///
/// The scrape runs on its own task so a client hanging up does not cancel the cycle.
pub(super) async fn metrics_handler<S: ScrapeSource>(State(state): State<AppState<S>>) -> Response {
    let metrics = state.coordinator.metrics();
    let encoded = if state.on_demand {
        let coordinator = state.coordinator.clone();
        match tokio::spawn(async move { coordinator.scrape().await }).await {
            Ok(ScrapeOutcome::Completed(_)) => metrics.encode(),
            Ok(ScrapeOutcome::Skipped) => metrics.encode_skipped(),
            Err(e) => {
                tracing::error!(error = %e, operation = "scrape", "scrape task failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
            }
        }
    } else {
        metrics.encode()
    };

    match encoded {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, operation = "encode_metrics", "metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// GET /: landing page.
pub(super) async fn index_handler() -> Html<String> {
    Html(format!(
        "<html>\n<head><title>Cluster Exporter</title></head>\n<body>\n\
         <h1>Cluster Exporter</h1>\n<p><a href='{}'>Metrics</a></p>\n</body>\n</html>\n",
        METRICS_PATH
    ))
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}
