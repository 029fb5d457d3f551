// HTTP routes: exposition, landing page, version

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::coordinator::ScrapeCoordinator;
use crate::source::ScrapeSource;

pub const METRICS_PATH: &str = "/metrics";

pub(crate) struct AppState<S> {
    pub(crate) coordinator: Arc<ScrapeCoordinator<S>>,
    /// Scrape on every /metrics request instead of serving the background worker's result.
    pub(crate) on_demand: bool,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            on_demand: self.on_demand,
        }
    }
}

pub fn app<S: ScrapeSource>(coordinator: Arc<ScrapeCoordinator<S>>, on_demand: bool) -> Router {
    let state = AppState {
        coordinator,
        on_demand,
    };
    Router::new()
        .route("/", get(http::index_handler)) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route(METRICS_PATH, get(http::metrics_handler::<S>)) // GET /metrics
        .with_state(state)
}
