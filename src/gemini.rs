//! Client for the Gemini text-generation API.
//!
//! One request type only: a prompt string plus a temperature, one round trip,
//! no retries, no streaming. `complete_json` adds tolerant JSON extraction for
//! prompts that instruct the model to answer with a bare JSON object - models
//! still occasionally wrap the object in a markdown fence or stray prose.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

/// Default base URL of the Gemini REST API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const MODEL: &str = "gemini-2.5-flash-lite";
const THINKING_BUDGET: u32 = 1024;

/// Completion client errors.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    /// The model answered, but no JSON object could be extracted.
    #[error("model output is not valid JSON:\n{raw}")]
    InvalidJson { raw: String },
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_base: String,
    api_key: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, api_base: Option<String>) -> Self {
        Self {
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    /// Single-round-trip completion. Temperature 0 asks for deterministic
    /// output; the thinking budget matches what the planner prompts assume.
    pub async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, GeminiError> {
        let url = format!("{}/models/{}:generateContent", self.api_base, MODEL);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": temperature,
                "thinkingConfig": { "thinkingBudget": THINKING_BUDGET },
            },
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, body });
        }

        let payload: Value = response.json().await?;
        let text = payload
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text.trim().to_string())
    }

    /// Complete, then extract and parse the first JSON object in the output.
    ///
    /// Parse failure carries the raw model text so callers can surface it for
    /// diagnostics instead of crashing.
    pub async fn complete_json(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<Value, GeminiError> {
        let raw = self.complete(prompt, temperature).await?;
        extract_json(&raw).ok_or(GeminiError::InvalidJson { raw })
    }
}

/// Pull the first JSON object out of model output.
///
/// Tolerates a markdown code fence around the object and prose before or
/// after it. Returns `None` when no parseable `{...}` span exists.
pub fn extract_json(raw: &str) -> Option<Value> {
    let cleaned = strip_fence(raw);
    let span = balanced_object(cleaned)?;
    serde_json::from_str(span).ok()
}

/// Remove a wrapping ```/```json fence, if any.
fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line.
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Find the first balanced `{...}` span, ignoring braces inside strings.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
