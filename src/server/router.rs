use axum::Router;
use axum::routing::{get, post};

use super::handlers;
use super::handlers::health::healthz;
use super::state::AppState;

pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/scrape", post(handlers::scrape::scrape_links))
        .route("/scrape_job_url", post(handlers::scrape::scrape_job_url))
        .route(
            "/analyze_job_posting",
            get(handlers::analyze::from_query).post(handlers::analyze::from_body),
        )
        .route("/analyze_resume", post(handlers::resume::analyze))
        .route("/save_job", post(handlers::jobs::save))
        .route("/jobs", get(handlers::jobs::list))
        .route("/export_excel", get(handlers::jobs::export))
        .route("/healthz", get(healthz))
        .with_state(state)
}
