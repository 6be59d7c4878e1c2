use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use log::info;
use serde::{Deserialize, Serialize};

use crate::models::job::{JobRecord, is_missing};
use crate::scraper::extract::{keywords_in, mentions};
use crate::server::error::{ApiError, ApiResult, invalid_json};
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResumeInput {
    pub resume: Option<String>,
    pub description: Option<String>,
    pub job: Option<JobRecord>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysis {
    pub suggestions: Vec<String>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    /// Share of the posting's keywords found in the resume, 0-100.
    pub compatibility_score: u8,
}

pub async fn analyze(
    State(state): State<AppState>,
    input: Result<Json<ResumeInput>, JsonRejection>,
) -> ApiResult<Json<ResumeAnalysis>> {
    let Json(input) = input.map_err(invalid_json)?;

    let resume = input
        .resume
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("expected a non-empty 'resume'"))?;

    let description = match (&input.description, &input.job) {
        (Some(description), _) if !description.trim().is_empty() => description.clone(),
        (_, Some(job)) => describe(job),
        _ => {
            return Err(ApiError::bad_request(
                "expected a job 'description' or a scraped 'job'",
            ));
        }
    };

    let keywords = match &input.job {
        Some(job) if !job.keywords.is_empty() => job.keywords.clone(),
        _ => keywords_in(&description),
    };
    let (matched, missing): (Vec<_>, Vec<_>) = keywords
        .into_iter()
        .partition(|keyword| mentions(&resume, keyword));

    let suggestions = state
        .agent
        .resume_suggestions(&description, &resume, input.model.as_deref())
        .await;

    let analysis = ResumeAnalysis {
        compatibility_score: score(matched.len(), missing.len()),
        suggestions,
        matched_keywords: matched,
        missing_keywords: missing,
    };
    info!(
        "resume matches {}/{} keywords",
        analysis.matched_keywords.len(),
        analysis.matched_keywords.len() + analysis.missing_keywords.len()
    );

    Ok(Json(analysis))
}

/// Plain-text rendering of a scraped job for the prompt.
fn describe(job: &JobRecord) -> String {
    let mut parts = Vec::new();
    for (label, value) in [
        ("Title", &job.title),
        ("Company", &job.company),
        ("Location", &job.location),
    ] {
        if !is_missing(value) {
            parts.push(format!("{}: {}", label, value));
        }
    }
    if !job.description.trim().is_empty() {
        parts.push(job.description.trim().to_string());
    }
    for (label, items) in [
        ("Requirements", &job.requirements),
        ("Responsibilities", &job.responsibilities),
        ("Keywords", &job.keywords),
    ] {
        if !items.is_empty() {
            parts.push(format!("{}: {}", label, items.join(", ")));
        }
    }
    parts.join("\n")
}

fn score(matched: usize, missing: usize) -> u8 {
    let total = matched + missing;
    if total == 0 {
        return 0;
    }
    ((matched * 100 + total / 2) / total) as u8
}
