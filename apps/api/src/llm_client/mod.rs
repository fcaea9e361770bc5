/// LLM Client — the only module allowed to talk to the Anthropic Messages API.
///
/// Planning and analysis both go through `call_json`; neither knows about HTTP,
/// retries or response envelopes.
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for every call. Fixed so planner behavior does not drift between deploys.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Text of the first text block, if any.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Shared client handle. Cheap to clone; injected wherever a model call is needed.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { client, api_key })
    }

    /// Raw call returning the full response envelope.
    /// Transport errors, 429 and 5xx are retried with exponential backoff; anything else
    /// fails immediately.
    pub async fn call(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
    ) -> Result<LlmResponse, LlmError> {
        let body = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error = None;
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!("Retrying LLM call in {}ms (attempt {})", delay.as_millis(), attempt + 1);
                tokio::time::sleep(delay).await;
            }

            match self.send_once(&body).await {
                Ok(response) => {
                    debug!(
                        "LLM usage: {} in / {} out tokens",
                        response.usage.input_tokens, response.usage.output_tokens
                    );
                    return Ok(response);
                }
                Err(Attempt::Retry(e)) => last_error = Some(e),
                Err(Attempt::Fatal(e)) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    async fn send_once(&self, body: &MessagesRequest<'_>) -> Result<LlmResponse, Attempt> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| Attempt::Retry(LlmError::Http(e)))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<LlmResponse>()
                .await
                .map_err(|e| Attempt::Fatal(LlmError::Http(e)));
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&raw)
            .map(|envelope| envelope.error.message)
            .unwrap_or(raw);
        warn!("LLM API returned {status}: {message}");

        let err = LlmError::Api {
            status: status.as_u16(),
            message,
        };
        if is_retryable(status) {
            Err(Attempt::Retry(err))
        } else {
            Err(Attempt::Fatal(err))
        }
    }

    /// Calls the model and deserializes its text answer as JSON.
    /// The prompt must instruct the model to return a single JSON value.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system, temperature).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        parse_json_payload(text)
    }
}

/// Outcome of a failed single request.
enum Attempt {
    Retry(LlmError),
    Fatal(LlmError),
}

/// 1s, 2s, 4s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1 << attempt.saturating_sub(1)))
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn parse_json_payload<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` fences the model sometimes adds despite instructions.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(str::trim)
                .unwrap_or(stripped)
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"add_skills\": []}\n```";
        assert_eq!(strip_json_fences(input), "{\"add_skills\": []}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"add_skills\": []}\n```";
        assert_eq!(strip_json_fences(input), "{\"add_skills\": []}");
    }

    #[test]
    fn test_strip_json_fences_unterminated() {
        let input = "```json\n{\"add_skills\": []}";
        assert_eq!(strip_json_fences(input), "{\"add_skills\": []}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"add_skills\": []}  ";
        assert_eq!(strip_json_fences(input), "{\"add_skills\": []}");
    }

    #[test]
    fn test_parse_json_payload_empty_is_empty_content() {
        let result: Result<serde_json::Value, _> = parse_json_payload("```json\n```");
        assert!(matches!(result, Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_parse_json_payload_garbage_is_parse_error() {
        let result: Result<serde_json::Value, _> = parse_json_payload("Sure! Here is the plan:");
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_response_text_picks_first_text_block() {
        let json = r#"{
            "content": [
                {"type": "tool_use", "text": null},
                {"type": "text", "text": "{}"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 2}
        }"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("{}"));
    }
}
