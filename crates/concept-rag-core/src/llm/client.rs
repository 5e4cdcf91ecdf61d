//! OpenAI-compatible chat-completion client (C4): request shape follows
//! an `openai_compatible_generate`-style POST, with a defensive JSON
//! parse guarding against non-JSON error bodies.

use super::LlmClient;
use crate::config::LlmConfig;
use crate::error::{LlmError, LlmErrorCategory};
use crate::types::{ConceptMetadata, ExtractionMode};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

pub struct ReqwestLlmClient {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl ReqwestLlmClient {
    pub fn new(config: LlmConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("reqwest client builds with default TLS backend");
        Self {
            config,
            api_key,
            client,
        }
    }

    async fn chat_completion(&self, prompt: &str) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.chat_completion_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = self.config.backoff_base_ms * 2u64.pow(attempt - 1);
                    tracing::warn!(attempt, backoff_ms = backoff, error = %e, "llm call failed, retrying");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn chat_completion_once(&self, prompt: &str) -> Result<String, LlmError> {
        let request = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.2,
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Transient {
                category: if e.is_timeout() {
                    LlmErrorCategory::Timeout
                } else {
                    LlmErrorCategory::Server
                },
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(categorize_http_error(status, body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        let trimmed = body.trim_start();
        if trimmed.starts_with('<') {
            return Err(LlmError::MalformedResponse(format!(
                "endpoint returned HTML instead of JSON: {}",
                trimmed.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::MalformedResponse("empty choices array".to_string()))
    }
}

fn categorize_http_error(status: reqwest::StatusCode, body: String) -> LlmError {
    match status.as_u16() {
        429 => LlmError::Transient {
            category: LlmErrorCategory::RateLimit,
            message: body,
        },
        500..=599 => LlmError::Transient {
            category: LlmErrorCategory::Server,
            message: body,
        },
        _ => LlmError::Permanent {
            category: LlmErrorCategory::BadRequest,
            message: format!("HTTP {status}: {body}"),
        },
    }
}

#[async_trait]
impl LlmClient for ReqwestLlmClient {
    async fn summarize(&self, text: &str, max_chars: usize) -> Result<String, LlmError> {
        let prompt_template = super::prompts::summary_prompt(self.config.summary_prompt_path.as_deref())
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        let prompt = prompt_template.render(text);
        let summary = self.chat_completion(&prompt).await?;
        Ok(summary.chars().take(max_chars).collect())
    }

    async fn extract_concepts(
        &self,
        text: &str,
        mode: ExtractionMode,
    ) -> Result<ConceptMetadata, LlmError> {
        let template = match mode {
            ExtractionMode::SinglePass => {
                super::prompts::concepts_prompt(self.config.concepts_prompt_path.as_deref())
            }
            ExtractionMode::Chunk => super::prompts::concepts_chunked_prompt(
                self.config.concepts_chunked_prompt_path.as_deref(),
            ),
        }
        .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let prompt = template.render(text);
        let raw = self.chat_completion(&prompt).await?;
        serde_json::from_str(&raw).map_err(|e| LlmError::MalformedResponse(e.to_string()))
    }
}

#[derive(serde::Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(serde::Deserialize)]
struct ChatMessage {
    content: String,
}

/// Deterministic test double (§ "Test Tooling"): no network calls,
/// configurable canned concepts/summary so extractor/indexer tests don't
/// depend on a live LLM endpoint.
#[cfg(test)]
pub struct MockLlmClient {
    pub summary: String,
    pub concepts: ConceptMetadata,
}

#[cfg(test)]
#[async_trait]
impl LlmClient for MockLlmClient {
    async fn summarize(&self, _text: &str, max_chars: usize) -> Result<String, LlmError> {
        Ok(self.summary.chars().take(max_chars).collect())
    }

    async fn extract_concepts(
        &self,
        _text: &str,
        _mode: ExtractionMode,
    ) -> Result<ConceptMetadata, LlmError> {
        Ok(self.concepts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_rate_limit_as_retryable() {
        let err = categorize_http_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".into());
        assert!(err.is_retryable());
    }

    #[test]
    fn categorizes_bad_request_as_non_retryable() {
        let err = categorize_http_error(reqwest::StatusCode::BAD_REQUEST, "bad".into());
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn mock_client_returns_canned_summary() {
        let mock = MockLlmClient {
            summary: "a short summary".to_string(),
            concepts: ConceptMetadata::default(),
        };
        let out = mock.summarize("irrelevant", 100).await.unwrap();
        assert_eq!(out, "a short summary");
    }
}
