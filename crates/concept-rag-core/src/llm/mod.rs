pub mod client;
pub mod prompts;

use crate::error::LlmError;
use crate::types::{ConceptMetadata, ExtractionMode};
use async_trait::async_trait;

/// LLM client contract (C4): summarization + concept extraction, nothing
/// chat- or agent-shaped. HTTP/retry mechanics follow an external-provider
/// pattern, collapsed to a single OpenAI-compatible path (the default
/// endpoint is OpenRouter, itself OpenAI-compatible) since no
/// provider-specific streaming/prompt-formatting is needed here.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn summarize(&self, text: &str, max_chars: usize) -> Result<String, LlmError>;

    async fn extract_concepts(
        &self,
        text: &str,
        mode: ExtractionMode,
    ) -> Result<ConceptMetadata, LlmError>;
}
