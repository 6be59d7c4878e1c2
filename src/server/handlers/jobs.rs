use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use log::{info, warn};
use serde::Serialize;

use crate::models::job::JobRecord;
use crate::server::error::{ApiResult, invalid_json};
use crate::server::state::AppState;
use crate::store::spreadsheet;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Serialize)]
pub struct SaveOutput {
    pub message: String,
    pub count: usize,
}

pub async fn save(
    State(state): State<AppState>,
    input: Result<Json<JobRecord>, JsonRejection>,
) -> ApiResult<Json<SaveOutput>> {
    let Json(job) = input.map_err(invalid_json)?;
    let title = job.title.clone();
    let count = state.saved.push(job);

    info!("saved job {} ({} held)", title, count);
    Ok(Json(SaveOutput {
        message: format!("Saved {}", title),
        count,
    }))
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<JobRecord>> {
    Json(state.saved.list())
}

pub async fn export(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    if state.saved.is_empty() {
        warn!("no saved jobs, exporting an empty workbook");
    }
    let jobs = state.saved.list();
    info!("exporting {} saved job(s)", jobs.len());

    let bytes = tokio::task::spawn_blocking(move || spreadsheet::render(&jobs)).await??;

    Ok((
        [
            (CONTENT_TYPE, XLSX_MIME),
            (CONTENT_DISPOSITION, "attachment; filename=\"jobs.xlsx\""),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn job(title: &str) -> Result<Json<JobRecord>, JsonRejection> {
        Ok(Json(JobRecord {
            title: title.to_string(),
            ..JobRecord::default()
        }))
    }

    #[tokio::test]
    async fn save_then_list() {
        let state = AppState::offline("save-list");

        let Json(first) = save(State(state.clone()), job("Cook")).await.unwrap();
        let Json(second) = save(State(state.clone()), job("Cook")).await.unwrap();
        assert_eq!(first.count, 1);
        assert_eq!(second.count, 2);

        let Json(jobs) = list(State(state)).await;
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.title == "Cook"));
    }

    #[tokio::test]
    async fn saved_store_is_bounded() {
        let state = AppState::offline("save-bounded");
        for title in ["a", "b", "c", "d"] {
            let _ = save(State(state.clone()), job(title)).await.unwrap();
        }

        let Json(jobs) = list(State(state)).await;
        let titles: Vec<_> = jobs.into_iter().map(|j| j.title).collect();
        assert_eq!(titles, vec!["b", "c", "d"]);
    }

    #[tokio::test]
    async fn export_is_an_xlsx_attachment() {
        let state = AppState::offline("export");
        let _ = save(State(state.clone()), job("Nurse")).await.unwrap();

        let response = export(State(state)).await.ok().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], XLSX_MIME);
        assert!(
            response.headers()[CONTENT_DISPOSITION]
                .to_str()
                .unwrap()
                .contains("jobs.xlsx")
        );
    }

    #[tokio::test]
    async fn empty_store_still_exports() {
        let state = AppState::offline("export-empty");

        let response = export(State(state)).await.ok().unwrap().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], XLSX_MIME);
    }
}
