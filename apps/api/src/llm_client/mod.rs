/// LLM Client: the single point of entry for all hosted-model calls in ResumeForge.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// All LLM interactions MUST go through this module.
///
/// Anthropic is called through the Messages API. OpenAI, Groq, DeepSeek and Google are
/// called through their OpenAI-compatible `/chat/completions` endpoints.
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod models;
pub mod prompts;

pub use models::Provider;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;

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

/// One turn of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A resolved model: which provider to call, with which model id and key.
#[derive(Debug, Clone)]
pub struct ModelTarget {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Normalized response text with token usage.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Error bodies differ per provider; both shapes carry `error.message`.
#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// The single LLM client used by all AI actions.
/// Wraps every provider with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
}

impl LlmClient {
    pub fn new() -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(120)).build()?,
        })
    }

    /// Single-prompt call.
    pub async fn call(
        &self,
        target: &ModelTarget,
        prompt: &str,
        system: &str,
    ) -> Result<LlmResponse, LlmError> {
        self.chat(target, &[ChatMessage::user(prompt)], system).await
    }

    /// Multi-turn call. Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn chat(
        &self,
        target: &ModelTarget,
        messages: &[ChatMessage],
        system: &str,
    ) -> Result<LlmResponse, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=MAX_RETRIES {
            if let Some(delay) = backoff_delay(attempt) {
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self.send(target, messages, system).await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("{} API returned {}: {}", target.provider.as_str(), status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ProviderError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed = self.parse(target.provider, response).await?;

            debug!(
                "LLM call succeeded: provider={}, model={}, input_tokens={}, output_tokens={}",
                target.provider.as_str(),
                target.model,
                parsed.input_tokens,
                parsed.output_tokens
            );

            return Ok(parsed);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        target: &ModelTarget,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(target, prompt, system).await?;
        let text = strip_json_fences(&response.text);
        serde_json::from_str(text).map_err(LlmError::Parse)
    }

    async fn send(
        &self,
        target: &ModelTarget,
        messages: &[ChatMessage],
        system: &str,
    ) -> reqwest::Result<reqwest::Response> {
        match target.provider {
            Provider::Anthropic => {
                let body = AnthropicRequest {
                    model: &target.model,
                    max_tokens: MAX_TOKENS,
                    system,
                    messages,
                };
                self.client
                    .post(ANTHROPIC_API_URL)
                    .header("x-api-key", &target.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .header("content-type", "application/json")
                    .json(&body)
                    .send()
                    .await
            }
            provider => {
                let body = CompletionRequest {
                    model: &target.model,
                    max_tokens: MAX_TOKENS,
                    messages: with_system_message(system, messages),
                };
                self.client
                    .post(format!("{}/chat/completions", provider.base_url()))
                    .bearer_auth(&target.api_key)
                    .json(&body)
                    .send()
                    .await
            }
        }
    }

    async fn parse(
        &self,
        provider: Provider,
        response: reqwest::Response,
    ) -> Result<LlmResponse, LlmError> {
        match provider {
            Provider::Anthropic => {
                let body: AnthropicResponse = response.json().await?;
                let text = body
                    .content
                    .into_iter()
                    .find(|b| b.block_type == "text")
                    .and_then(|b| b.text)
                    .ok_or(LlmError::EmptyContent)?;
                Ok(LlmResponse {
                    text,
                    input_tokens: body.usage.input_tokens,
                    output_tokens: body.usage.output_tokens,
                })
            }
            _ => {
                let body: CompletionResponse = response.json().await?;
                let usage = body.usage;
                let text = body
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .filter(|t| !t.is_empty())
                    .ok_or(LlmError::EmptyContent)?;
                Ok(LlmResponse {
                    text,
                    input_tokens: usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
                    output_tokens: usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0),
                })
            }
        }
    }
}

/// Wait before `attempt`: none for the first call, then 1s, 2s, 4s.
fn backoff_delay(attempt: u32) -> Option<Duration> {
    attempt
        .checked_sub(1)
        .map(|n| Duration::from_millis(1000 << n))
}

fn with_system_message(system: &str, messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut all = Vec::with_capacity(messages.len() + 1);
    all.push(ChatMessage {
        role: "system".to_string(),
        content: system.to_string(),
    });
    all.extend_from_slice(messages);
    all
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_backoff_schedule() {
        let waits: Vec<_> = (0..=MAX_RETRIES).map(backoff_delay).collect();
        assert_eq!(
            waits,
            vec![
                None,
                Some(Duration::from_secs(1)),
                Some(Duration::from_secs(2)),
                Some(Duration::from_secs(4)),
            ]
        );
    }

    #[test]
    fn test_system_message_goes_first() {
        let messages = with_system_message("be terse", &[ChatMessage::user("hi")]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1], ChatMessage::user("hi"));
    }

    #[test]
    fn test_completion_response_parses() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}],"usage":{"prompt_tokens":3,"completion_tokens":1}}"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("ok"));
        assert_eq!(parsed.usage.unwrap().prompt_tokens, 3);
    }
}
