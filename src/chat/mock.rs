//! Loopback `/chat/completions` server for exercising the LLM paths in tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use super::client::LlmClient;
use crate::utils::config::ConfigInner;

type Reply = Arc<dyn Fn(&Value) -> String + Send + Sync>;

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: Reply,
    calls: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
}

pub struct MockLlm {
    endpoint: String,
    calls: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
}

impl MockLlm {
    /// Answers every request with `reply(body)`, as a JSON completion or as
    /// an event stream when the request asks for one.
    pub async fn start(reply: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        Self::serve(StatusCode::OK, Arc::new(reply)).await
    }

    /// Rejects every request with `status`.
    pub async fn failing(status: StatusCode) -> Self {
        Self::serve(status, Arc::new(|_: &Value| String::new())).await
    }

    async fn serve(status: StatusCode, reply: Reply) -> Self {
        let state = MockState {
            status,
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
            last_body: Arc::new(Mutex::new(None)),
        };
        let (calls, last_body) = (state.calls.clone(), state.last_body.clone());

        let app = Router::new()
            .route("/chat/completions", post(completions))
            .with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self {
            endpoint,
            calls,
            last_body,
        }
    }

    pub fn client(&self, max_retries: u32) -> LlmClient {
        client_for(&self.endpoint, max_retries)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Content of the last user message received.
    pub fn last_prompt(&self) -> String {
        let body = self.last_body.lock().unwrap();
        body.as_ref()
            .and_then(|b| b["messages"].as_array())
            .and_then(|messages| messages.last())
            .and_then(|m| m["content"].as_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// A client whose endpoint refuses connections.
pub fn unreachable_client() -> LlmClient {
    client_for("http://127.0.0.1:9", 0)
}

fn client_for(endpoint: &str, max_retries: u32) -> LlmClient {
    let mut config = ConfigInner::default().llm;
    config.endpoint = endpoint.to_string();
    config.max_retries = max_retries;
    LlmClient::new("sk-test".to_string(), &config)
}

async fn completions(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    *state.last_body.lock().unwrap() = Some(body.clone());

    if !state.status.is_success() {
        return (state.status, "upstream overloaded").into_response();
    }

    let text = (state.reply)(&body);
    if body["stream"] != true {
        return Json(json!({ "choices": [{ "message": { "content": text } }] })).into_response();
    }

    let mut events = String::from(": OPENROUTER PROCESSING\n\n");
    for word in text.split_inclusive(' ') {
        let chunk = json!({ "choices": [{ "delta": { "content": word } }] });
        events.push_str(&format!("data: {}\n\n", chunk));
    }
    events.push_str("data: [DONE]\n\n");

    ([(CONTENT_TYPE, "text/event-stream")], events).into_response()
}
