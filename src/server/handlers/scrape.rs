use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::models::job::JobRecord;
use crate::server::error::{ApiError, ApiResult, invalid_json};
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeLinksInput {
    pub links: Option<Vec<String>>,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeUrlInput {
    pub url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FailedLink {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ScrapeLinksOutput {
    pub message: String,
    pub jobs: Vec<JobRecord>,
    pub failed: Vec<FailedLink>,
}

/// Scrapes every link in order and appends the results to the spreadsheet.
/// A link that cannot be fetched is reported, it does not abort the batch.
pub async fn scrape_links(
    State(state): State<AppState>,
    input: Result<Json<ScrapeLinksInput>, JsonRejection>,
) -> ApiResult<Json<ScrapeLinksOutput>> {
    let Json(input) = input.map_err(invalid_json)?;
    let links = input
        .links
        .ok_or_else(|| ApiError::bad_request("Invalid input, expected 'links' key in JSON"))?;

    info!("scraping {} link(s)", links.len());

    let mut jobs = Vec::new();
    let mut failed = Vec::new();
    for link in links.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        match state.scraper.scrape(link, input.model.as_deref()).await {
            Ok(job) => jobs.push(job),
            Err(e) => {
                warn!("skipping {}: {:#}", link, e);
                failed.push(FailedLink {
                    url: link.to_string(),
                    error: format!("{:#}", e),
                });
            }
        }
    }

    if !jobs.is_empty() {
        let spreadsheet = state.spreadsheet.clone();
        let batch = jobs.clone();
        tokio::task::spawn_blocking(move || spreadsheet.append(&batch)).await??;
    }

    let message = if failed.is_empty() {
        "Scraping completed successfully".to_string()
    } else {
        format!(
            "Scraped {} of {} link(s)",
            jobs.len(),
            jobs.len() + failed.len()
        )
    };

    Ok(Json(ScrapeLinksOutput {
        message,
        jobs,
        failed,
    }))
}

pub async fn scrape_job_url(
    State(state): State<AppState>,
    input: Result<Json<ScrapeUrlInput>, JsonRejection>,
) -> ApiResult<Json<JobRecord>> {
    let Json(input) = input.map_err(invalid_json)?;
    let url = input
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::bad_request("expected a non-empty 'url'"))?;

    let job = state
        .scraper
        .scrape(url, input.model.as_deref())
        .await
        .map_err(|e| ApiError::bad_gateway(format!("{:#}", e)))?;

    Ok(Json(job))
}
