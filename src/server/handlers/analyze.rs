use std::convert::Infallible;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use futures::stream::{BoxStream, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::models::job::JobRecord;
use crate::scraper::extract::keywords_in;
use crate::scraper::summary::SummaryHints;
use crate::server::error::{ApiError, ApiResult, invalid_json, invalid_query};
use crate::server::state::AppState;
use crate::utils::text::truncate_chars;

#[derive(Debug, Deserialize)]
pub struct AnalyzeInput {
    pub description: Option<String>,
    pub model: Option<String>,
}

type EventStream = Sse<KeepAliveStream<BoxStream<'static, Result<Event, Infallible>>>>;

pub async fn from_query(
    State(state): State<AppState>,
    input: Result<Query<AnalyzeInput>, QueryRejection>,
) -> ApiResult<EventStream> {
    let Query(input) = input.map_err(invalid_query)?;
    open_stream(state, input)
}

pub async fn from_body(
    State(state): State<AppState>,
    input: Result<Json<AnalyzeInput>, JsonRejection>,
) -> ApiResult<EventStream> {
    let Json(input) = input.map_err(invalid_json)?;
    open_stream(state, input)
}

fn open_stream(state: AppState, input: AnalyzeInput) -> ApiResult<EventStream> {
    let description = input
        .description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("expected a non-empty 'description'"))?;

    info!("streaming analysis of a {} character posting", description.len());

    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(relay(state, description, input.model, tx));

    let events = futures::stream::unfold(rx, |mut rx| async move {
        let payload: Value = rx.recv().await?;
        Some((Ok::<_, Infallible>(Event::default().data(payload.to_string())), rx))
    });

    Ok(Sse::new(events.boxed()).keep_alive(KeepAlive::default()))
}

/// Forwards summary chunks as `{"text"}` payloads, then always finishes
/// with a `{"complete": true}` payload carrying the joined summary.
async fn relay(state: AppState, description: String, model: Option<String>, tx: mpsc::Sender<Value>) {
    let mut summary = String::new();

    match state.agent.stream_summary(&description, model.as_deref()).await {
        Ok(mut chunks) => {
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(text) => {
                        summary.push_str(&text);
                        if tx.send(json!({ "text": text })).await.is_err() {
                            debug!("analysis client disconnected");
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("summary stream failed: {}", e);
                        let _ = tx.send(json!({ "error": e.to_string() })).await;
                        break;
                    }
                }
            }
        }
        Err(e) => {
            warn!("could not start summary stream: {}", e);
            let _ = tx.send(json!({ "error": e.to_string() })).await;
        }
    }

    let job = job_from_summary(&description, &summary, state.config.llm.max_input_chars);
    let _ = tx
        .send(json!({ "complete": true, "summary": summary, "job": job }))
        .await;
}

/// Best-effort record built from the summary hints and the raw posting.
fn job_from_summary(description: &str, summary: &str, max_chars: usize) -> Option<JobRecord> {
    if summary.trim().is_empty() {
        return None;
    }

    let mut job = JobRecord {
        description: truncate_chars(description.trim(), max_chars).to_string(),
        keywords: keywords_in(description),
        ..JobRecord::default()
    };
    job.merge_missing(&SummaryHints::parse(summary).to_fields());
    Some(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::UNKNOWN;
    use axum::http::StatusCode;
    use axum::http::header::CONTENT_TYPE;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn empty_description_is_rejected() {
        let input = Ok(Query(AnalyzeInput {
            description: Some(" ".to_string()),
            model: None,
        }));

        let err = from_query(State(AppState::offline("analyze-empty")), input)
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn posted_description_opens_an_event_stream() {
        let input = Ok(Json(AnalyzeInput {
            description: Some("Line cook wanted".to_string()),
            model: None,
        }));

        let response = from_body(State(AppState::offline("analyze-stream")), input)
            .await
            .ok()
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");
    }

    #[tokio::test]
    async fn relay_without_llm_reports_unavailable_then_completes() {
        let state = AppState::offline("analyze-relay");
        let (tx, mut rx) = mpsc::channel(8);

        relay(state, "Cook wanted".to_string(), None, tx).await;

        let first = rx.recv().await.unwrap();
        assert!(first["error"].as_str().unwrap().contains("unavailable"));

        let last = rx.recv().await.unwrap();
        assert_eq!(last["complete"], true);
        assert_eq!(last["summary"], "");
        assert!(last["job"].is_null());
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn summary_hints_shape_the_job() {
        let job = job_from_summary(
            "We need SQL and Excel skills.",
            "Globex is hiring a Data Analyst to build reports at Globex Corp.",
            100,
        )
        .unwrap();

        assert_eq!(job.title, "Data Analyst");
        assert_eq!(job.company, "Globex Corp");
        assert_eq!(job.salary, UNKNOWN);
        assert_eq!(job.keywords, vec!["SQL", "Excel"]);
        assert!(job_from_summary("anything", "  ", 100).is_none());
    }
}
