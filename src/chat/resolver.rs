use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use super::client::{ChatMessage, LlmClient};
use crate::utils::text::{fill_template, strip_bullet, truncate_chars};

/// Outcome of asking the LLM for structured data. Every failure mode maps
/// to a variant; callers never see an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Resolution {
    /// The response contained a JSON object.
    Structured(Map<String, Value>),
    /// No JSON object could be read; the response (or the failure message)
    /// split into non-empty lines. Never empty.
    Unstructured(Vec<String>),
    /// No credentials are configured.
    Unavailable(String),
}

impl Resolution {
    pub fn structured(&self) -> Option<&Map<String, Value>> {
        match self {
            Resolution::Structured(map) => Some(map),
            _ => None,
        }
    }

    /// Human readable lines for display, whatever the variant.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Resolution::Structured(map) => map
                .iter()
                .map(|(key, value)| match value {
                    Value::String(s) => format!("{}: {}", key, s),
                    other => format!("{}: {}", key, other),
                })
                .collect(),
            Resolution::Unstructured(lines) => lines.clone(),
            Resolution::Unavailable(reason) => vec![reason.clone()],
        }
    }
}

pub struct ResolveRequest<'a> {
    pub system_prompt: &'a str,
    /// Prompt with a `{content}` placeholder for the (truncated) page text.
    pub prompt_template: &'a str,
    /// Values for any other placeholders in the template.
    pub placeholders: &'a [(&'a str, &'a str)],
    pub content: &'a str,
    pub max_input_chars: usize,
    pub model: Option<&'a str>,
}

/// Asks the LLM for a JSON object and interprets whatever comes back.
pub async fn resolve(client: Option<&LlmClient>, request: ResolveRequest<'_>) -> Resolution {
    let Some(client) = client else {
        return unavailable();
    };

    let content = truncate_chars(request.content, request.max_input_chars);
    if content.len() < request.content.len() {
        debug!(
            "truncated resolver input from {} to {} bytes",
            request.content.len(),
            content.len()
        );
    }

    let mut values = request.placeholders.to_vec();
    values.push(("content", content));

    let messages = [
        ChatMessage::system(request.system_prompt),
        ChatMessage::user(fill_template(request.prompt_template, &values)),
    ];

    match client.complete(&messages, request.model, true).await {
        Ok(raw) => {
            let resolution = interpret(&raw);
            if resolution.structured().is_some() {
                info!("LLM returned structured data");
            } else {
                warn!("LLM response was not JSON, keeping it as plain lines");
            }
            resolution
        }
        Err(e) => {
            warn!("LLM request failed: {}", e);
            Resolution::Unstructured(vec![format!("AI analysis failed: {}", e)])
        }
    }
}

pub const UNAVAILABLE: &str = "AI analysis unavailable: no LLM API key configured";

pub fn unavailable() -> Resolution {
    Resolution::Unavailable(UNAVAILABLE.to_string())
}

/// Reads a JSON object out of `raw`, tolerating prose or code fences around
/// it. Falls back to the non-empty lines of `raw`.
pub fn interpret(raw: &str) -> Resolution {
    if let Some(map) = json_object_in(raw) {
        return Resolution::Structured(map);
    }

    let lines = split_lines(raw);
    if lines.is_empty() {
        Resolution::Unstructured(vec!["AI returned an empty response".to_string()])
    } else {
        Resolution::Unstructured(lines)
    }
}

fn json_object_in(raw: &str) -> Option<Map<String, Value>> {
    let parse = |candidate: &str| match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    };

    if let Some(map) = parse(raw.trim()) {
        return Some(map);
    }

    if let Some(block) = balanced_block(raw)
        && let Some(map) = parse(block)
    {
        return Some(map);
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| parse(&raw[start..=end])).flatten()
}

/// The first `{ ... }` block whose braces balance, ignoring braces inside
/// JSON strings.
pub fn balanced_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Non-empty lines with bullets and code fences removed.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("```"))
        .map(strip_bullet)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
