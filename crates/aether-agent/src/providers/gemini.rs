// ABOUTME: Google Gemini API adapter implementing the LlmClient trait.
// ABOUTME: Translates conversation turns into generateContent calls with function declarations and back.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use aether_core::{Part, Turn};

use crate::llm::{GenerateRequest, LlmClient, LlmError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const MAX_TOKENS: u32 = 8192;
const API_KEY_HEADER: &str = "x-goog-api-key";
const RETRY_INFO_TYPE: &str = "type.googleapis.com/google.rpc.RetryInfo";

/// Google Gemini client. Calls the generateContent API with function
/// declarations and maps the candidate's parts back into a model turn.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a client reading configuration from environment variables.
    /// Required: `GEMINI_API_KEY`
    /// Optional: `GEMINI_BASE_URL` (defaults to https://generativelanguage.googleapis.com)
    /// Optional: `GEMINI_MODEL` (defaults to gemini-2.5-flash)
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| LlmError::Unauthorized("GEMINI_API_KEY not set".to_string()))?;

        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_key, base_url, model))
    }

    /// Create a client with explicit configuration.
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    /// Build the JSON request body for the generateContent API.
    pub fn build_request_body(request: &GenerateRequest) -> Value {
        let contents: Vec<Value> = request.history.iter().map(turn_to_content).collect();

        // Gemini requires alternating roles
        let contents = coalesce_gemini_contents(contents);

        let mut body = json!({
            "system_instruction": {
                "parts": [{"text": request.system_instruction}]
            },
            "contents": contents,
            "generation_config": {
                "max_output_tokens": MAX_TOKENS
            }
        });

        if !request.tools.is_empty() {
            body["tools"] = json!([{ "function_declarations": request.tools }]);
        }

        body
    }

    /// Parse a generateContent response into the parts of one model turn.
    ///
    /// A candidate without content (e.g. stopped for safety or length) yields
    /// an empty turn rather than an error; the agent loop substitutes a
    /// placeholder reply.
    pub fn parse_response(response_body: &Value) -> Result<Vec<Part>, LlmError> {
        let candidates = response_body
            .get("candidates")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                LlmError::InvalidResponse("missing candidates array in response".to_string())
            })?;

        let candidate = candidates
            .first()
            .ok_or_else(|| LlmError::InvalidResponse("empty candidates array".to_string()))?;

        let Some(parts) = candidate
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(|p| p.as_array())
        else {
            let finish_reason = candidate
                .get("finishReason")
                .and_then(|f| f.as_str())
                .unwrap_or("UNKNOWN");
            tracing::warn!(finish_reason, "gemini candidate has no content");
            return Ok(Vec::new());
        };

        let mut result = Vec::with_capacity(parts.len());
        for part in parts {
            if let Some(function_call) = part.get("functionCall") {
                let name = function_call
                    .get("name")
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| {
                        LlmError::InvalidResponse("functionCall missing name".to_string())
                    })?;
                let args = function_call.get("args").cloned().unwrap_or(json!({}));
                result.push(Part::function_call(name, args));
            } else if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                result.push(Part::text(text));
            }
        }

        Ok(result)
    }
}

/// Convert one conversation turn into a Gemini `content` object.
fn turn_to_content(turn: &Turn) -> Value {
    match turn {
        Turn::User { text } => json!({
            "role": "user",
            "parts": [{"text": text}]
        }),
        Turn::Model { parts } => {
            let parts: Vec<Value> = parts
                .iter()
                .map(|part| match part {
                    Part::Text { text } => json!({"text": text}),
                    Part::FunctionCall { call } => json!({
                        "functionCall": {"name": call.name, "args": call.args}
                    }),
                })
                .collect();
            json!({"role": "model", "parts": parts})
        }
        Turn::ToolResult { tool_name, result } => json!({
            "role": "user",
            "parts": [{
                "functionResponse": {
                    "name": tool_name,
                    "response": {"result": result}
                }
            }]
        }),
    }
}

/// Coalesce consecutive Gemini contents with the same role by concatenating
/// their parts. Part order is preserved.
fn coalesce_gemini_contents(contents: Vec<Value>) -> Vec<Value> {
    let mut result: Vec<Value> = Vec::with_capacity(contents.len());

    for content in contents {
        let role = content.get("role").and_then(|r| r.as_str()).unwrap_or("user");
        let parts = content
            .get("parts")
            .and_then(|p| p.as_array())
            .cloned()
            .unwrap_or_default();

        if let Some(last) = result.last_mut()
            && last.get("role").and_then(|r| r.as_str()) == Some(role)
            && let Some(last_parts) = last.get_mut("parts").and_then(|p| p.as_array_mut())
        {
            last_parts.extend(parts);
            continue;
        }

        result.push(json!({"role": role, "parts": parts}));
    }

    result
}

/// Map a non-success HTTP response into an LlmError.
fn classify_error(status: reqwest::StatusCode, retry_after_header: Option<&str>, body: &str) -> LlmError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let from_body = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| parse_retry_delay(&v));
        let from_header = retry_after_header
            .and_then(|h| h.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return LlmError::RateLimited {
            retry_after: from_body.or(from_header),
        };
    }

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return LlmError::Unauthorized("check GEMINI_API_KEY".to_string());
    }

    if status.is_server_error() || status == reqwest::StatusCode::REQUEST_TIMEOUT {
        return LlmError::Server {
            status: status.as_u16(),
            body: body.to_string(),
        };
    }

    LlmError::Api {
        status: status.as_u16(),
        body: body.to_string(),
    }
}

/// Extract the server-suggested wait from a Gemini error payload, i.e. the
/// `retryDelay` of a `google.rpc.RetryInfo` detail ("37s", "0.5s").
pub fn parse_retry_delay(error_body: &Value) -> Option<Duration> {
    error_body
        .get("error")?
        .get("details")?
        .as_array()?
        .iter()
        .filter(|d| d.get("@type").and_then(|t| t.as_str()) == Some(RETRY_INFO_TYPE))
        .find_map(|d| d.get("retryDelay").and_then(|r| r.as_str()))
        .and_then(parse_duration_seconds)
}

fn parse_duration_seconds(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().strip_suffix('s')?.parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<Part>, LlmError> {
        let body = Self::build_request_body(request);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        // The key must never appear in error text, which reaches agent histories.
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.without_url().to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let error_body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, retry_after.as_deref(), &error_body));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| {
                LlmError::Transport(format!("failed to read response body: {}", e.without_url()))
            })?;

        Self::parse_response(&response_body)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
