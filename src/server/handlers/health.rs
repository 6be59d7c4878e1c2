use axum::Json;
use axum::extract::State;
use log::debug;
use serde_json::{Value, json};

use crate::server::state::AppState;

pub async fn healthz(State(state): State<AppState>) -> Json<Value> {
    debug!("service is healthy");
    Json(json!({
        "status": "ok",
        "ai": state.agent.is_available(),
        "saved_jobs": state.saved.len(),
    }))
}
