//! LLM Client: the single point of entry for every model call the assessor makes.
//!
//! ARCHITECTURAL RULE: stages never talk to a provider API directly. They hold an
//! `Arc<dyn LanguageModel>` and go through [`call_json`], which strips fences,
//! deserializes and validates the structured output.
//!
//! Provider, model, temperature, timeout and retry count all come from
//! [`Config`]; nothing here reads the environment.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, LlmProvider};
use crate::models::Validate;

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("output failed validation: {0}")]
    Validation(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// True when the provider answered but the payload did not fit the
    /// expected shape. Everything else is a provider/transport failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, LlmError::Parse(_) | LlmError::Validation(_))
    }
}

/// Anything that can turn a system + user prompt into raw text.
///
/// `LlmClient` is the production implementation; tests substitute canned
/// responses.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

/// Calls the model and deserializes the text response as JSON, then runs the
/// record's [`Validate`] checks. The prompt must instruct the model to return
/// valid JSON.
pub async fn call_json<T>(llm: &dyn LanguageModel, prompt: &str, system: &str) -> Result<T, LlmError>
where
    T: DeserializeOwned + Validate,
{
    let text = llm.complete(prompt, system).await?;

    // Strip markdown code fences if the model wraps JSON in them
    let text = strip_json_fences(&text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }

    let value: T = serde_json::from_str(text)?;
    value.validate().map_err(LlmError::Validation)?;
    Ok(value)
}

// ────────────────────────────────────────────────────────────────────────────
// Provider wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicResponse {
    /// Extracts the text content from the first text block.
    fn text(self) -> Option<String> {
        self.content
            .into_iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text)
    }
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

impl OpenAiResponse {
    fn text(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

impl GeminiResponse {
    fn text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The HTTP-backed model client shared by all stages.
/// Wraps the configured provider's API with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    provider: LlmProvider,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()?,
            provider: config.provider,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries.max(1),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    fn build_request(&self, prompt: &str, system: &str) -> RequestBuilder {
        match self.provider {
            LlmProvider::Anthropic => self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&AnthropicRequest {
                    model: &self.model,
                    max_tokens: self.max_tokens,
                    temperature: self.temperature,
                    system,
                    messages: vec![ChatMessage {
                        role: "user",
                        content: prompt,
                    }],
                }),
            LlmProvider::OpenAi => self
                .client
                .post(OPENAI_API_URL)
                .bearer_auth(&self.api_key)
                .json(&OpenAiRequest {
                    model: &self.model,
                    max_tokens: self.max_tokens,
                    temperature: self.temperature,
                    response_format: ResponseFormat {
                        format_type: "json_object",
                    },
                    messages: vec![
                        ChatMessage {
                            role: "system",
                            content: system,
                        },
                        ChatMessage {
                            role: "user",
                            content: prompt,
                        },
                    ],
                }),
            LlmProvider::Gemini => self
                .client
                .post(format!("{GEMINI_API_BASE}/{}:generateContent", self.model))
                .query(&[("key", self.api_key.as_str())])
                .json(&GeminiRequest {
                    system_instruction: GeminiContent {
                        role: None,
                        parts: vec![GeminiPart { text: system }],
                    },
                    contents: vec![GeminiContent {
                        role: Some("user"),
                        parts: vec![GeminiPart { text: prompt }],
                    }],
                    generation_config: GeminiGenerationConfig {
                        temperature: self.temperature,
                        max_output_tokens: self.max_tokens,
                        response_mime_type: "application/json",
                    },
                }),
        }
    }

    /// Makes a raw call to the provider and returns the text of the reply.
    /// Retries on 429 (rate limit), 5xx and transport errors with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(6)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.build_request(prompt, system).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
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

            let body = response.text().await?;
            return self.extract_text(&body);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_retries,
        }))
    }

    fn extract_text(&self, body: &str) -> Result<String, LlmError> {
        let text = match self.provider {
            LlmProvider::Anthropic => {
                let parsed: AnthropicResponse = serde_json::from_str(body)?;
                if let Some(usage) = &parsed.usage {
                    debug!(
                        "LLM call succeeded: input_tokens={}, output_tokens={}",
                        usage.input_tokens, usage.output_tokens
                    );
                }
                parsed.text()
            }
            LlmProvider::OpenAi => serde_json::from_str::<OpenAiResponse>(body)?.text(),
            LlmProvider::Gemini => serde_json::from_str::<GeminiResponse>(body)?.text(),
        };
        text.ok_or(LlmError::EmptyContent)
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        self.call(prompt, system).await
    }
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
    use crate::models::CultureFit;

    struct CannedModel(&'static str);

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    fn make_client(provider: LlmProvider) -> LlmClient {
        let config = Config::with_provider(provider, |key| match key {
            "ANTHROPIC_API_KEY" | "OPENAI_API_KEY" | "GEMINI_API_KEY" => Some("k".to_string()),
            _ => None,
        })
        .unwrap();
        LlmClient::new(&config).unwrap()
    }

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

    #[tokio::test]
    async fn test_call_json_parses_fenced_output() {
        let llm = CannedModel("```json\n{\"culture_fit_score\": 0.7, \"notes\": \"ok\"}\n```");
        let fit: CultureFit = call_json(&llm, "p", "s").await.unwrap();
        assert!((fit.culture_fit_score - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_call_json_rejects_invalid_record() {
        let llm = CannedModel(r#"{"culture_fit_score": 3.0, "notes": "ok"}"#);
        let err = call_json::<CultureFit>(&llm, "p", "s").await.unwrap_err();
        assert!(matches!(err, LlmError::Validation(_)));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_call_json_wrong_shape_is_parse_error() {
        let llm = CannedModel(r#"{"score": "high"}"#);
        let err = call_json::<CultureFit>(&llm, "p", "s").await.unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[tokio::test]
    async fn test_call_json_empty_output() {
        let llm = CannedModel("   ");
        let err = call_json::<CultureFit>(&llm, "p", "s").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_extract_text_anthropic() {
        let client = make_client(LlmProvider::Anthropic);
        let body = r#"{
            "content": [{"type": "text", "text": "{\"a\": 1}"}],
            "usage": {"input_tokens": 10, "output_tokens": 4}
        }"#;
        assert_eq!(client.extract_text(body).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_text_openai() {
        let client = make_client(LlmProvider::OpenAi);
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "{}"}}]}"#;
        assert_eq!(client.extract_text(body).unwrap(), "{}");
    }

    #[test]
    fn test_extract_text_gemini_joins_parts() {
        let client = make_client(LlmProvider::Gemini);
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}}]}"#;
        assert_eq!(client.extract_text(body).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_text_without_content_is_empty_error() {
        let client = make_client(LlmProvider::Gemini);
        let err = client.extract_text(r#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[test]
    fn test_client_uses_configured_model() {
        let client = make_client(LlmProvider::OpenAi);
        assert_eq!(client.model(), "gpt-4o");
        assert_eq!(client.provider(), LlmProvider::OpenAi);
    }
}
