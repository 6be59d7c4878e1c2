use std::collections::VecDeque;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use eyre::{Result, eyre};
use futures::stream::{BoxStream, StreamExt};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Value, json};

use crate::utils::config::LLMConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// OpenAI-compatible chat completions client (OpenRouter by default).
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl LlmClient {
    pub fn new(api_key: String, config: &LLMConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        }
    }

    /// `None` when no API key is configured or present in the environment.
    pub fn from_config(config: &LLMConfig) -> Option<Self> {
        match config.resolved_api_key() {
            Some(key) => Some(Self::new(key, config)),
            None => {
                warn!(
                    "no LLM API key configured (set llm.api_key or {}), AI features are unavailable",
                    config.api_key_env
                );
                None
            }
        }
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    fn request_body(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>,
        json_mode: bool,
        stream: bool,
    ) -> Value {
        let mut body = json!({
            "model": model.unwrap_or(&self.model),
            "messages": messages,
            "temperature": self.temperature,
        });

        if json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }
        if stream {
            body["stream"] = json!(true);
        }

        body
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let url = self.url();

        (|| async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let error_body = response.text().await?;
                return Err(eyre!("LLM request failed ({}): {}", status, error_body));
            }

            Ok(response)
        })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(500))
                .with_max_times(self.max_retries as usize),
        )
        .notify(|err, dur| warn!("LLM request failed, retrying in {:?}: {}", dur, err))
        .await
    }

    /// Sends a chat completion and returns the assistant message text.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>,
        json_mode: bool,
    ) -> Result<String> {
        let body = self.request_body(messages, model, json_mode, false);
        info!(
            "calling LLM (model: {}, json: {}, max retries: {})",
            body["model"], json_mode, self.max_retries
        );

        let response: Value = self.send(&body).await?.json().await?;
        let content = message_content(&response)
            .ok_or_else(|| eyre!("invalid LLM response structure"))?;

        debug!("LLM response length: {} characters", content.len());
        Ok(content.to_string())
    }

    /// Streams the assistant message as it is generated, one delta per item.
    pub async fn stream(
        &self,
        messages: &[ChatMessage],
        model: Option<&str>,
    ) -> Result<BoxStream<'static, Result<String>>> {
        let body = self.request_body(messages, model, false, true);
        info!("opening LLM stream (model: {})", body["model"]);

        let bytes = Box::pin(self.send(&body).await?.bytes_stream());

        let state = (bytes, StreamDecoder::default(), VecDeque::new(), false);
        let stream = futures::stream::unfold(state, |(mut bytes, mut decoder, mut pending, mut done)| async move {
            loop {
                if let Some(item) = pending.pop_front() {
                    return Some((item, (bytes, decoder, pending, done)));
                }
                if done {
                    return None;
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        for event in decoder.push(&chunk) {
                            match event {
                                StreamEvent::Delta(text) => pending.push_back(Ok(text)),
                                StreamEvent::Error(message) => {
                                    pending.push_back(Err(eyre!("LLM stream error: {}", message)));
                                    done = true;
                                }
                                StreamEvent::Done => done = true,
                            }
                            if done {
                                break;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        pending.push_back(Err(e.into()));
                        done = true;
                    }
                    None => done = true,
                }
            }
        });

        Ok(stream.boxed())
    }
}

fn message_content(response: &Value) -> Option<&str> {
    response
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Delta(String),
    Error(String),
    Done,
}

/// Incremental decoder for `text/event-stream` chat completion bodies.
/// Network chunks may end anywhere, including inside a UTF-8 sequence, so
/// bytes are buffered until a full line is available.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
}

impl StreamDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<_>>();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = Self::parse_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    fn parse_line(line: &str) -> Option<StreamEvent> {
        // comments (": OPENROUTER PROCESSING") and other fields are keep-alives
        let payload = line.strip_prefix("data:")?.trim();
        if payload.is_empty() {
            return None;
        }
        if payload == "[DONE]" {
            return Some(StreamEvent::Done);
        }

        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                debug!("skipping undecodable stream line: {}", e);
                return None;
            }
        };

        if let Some(error) = value.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Some(StreamEvent::Error(message));
        }

        value
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("delta"))
            .and_then(|d| d.get("content"))
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(|text| StreamEvent::Delta(text.to_string()))
    }
}
