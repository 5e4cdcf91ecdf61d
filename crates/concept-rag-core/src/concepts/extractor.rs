//! Concept extractor (C9, §4.9): drives the LLM client to produce
//! per-document `ConceptMetadata`, after filtering out metadata/TOC noise
//! (headers, page numbers, copyright lines) that would otherwise pollute
//! the prompt.

use crate::error::LlmError;
use crate::llm::LlmClient;
use crate::types::{ConceptMetadata, ExtractionMode};
use regex::Regex;
use std::sync::Arc;

/// Above this many (whitespace-approximated) tokens, extraction runs in
/// chunk mode instead of a single pass (§4.9 default >100k tokens).
pub struct ConceptExtractor {
    llm: Arc<dyn LlmClient>,
    chunk_mode_token_threshold: usize,
    noise_filter: Regex,
}

impl ConceptExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, chunk_mode_token_threshold: usize) -> Self {
        let noise_filter = Regex::new(
            r"(?mi)^\s*(page\s+\d+(\s+of\s+\d+)?|copyright\s+©.*|\u{a9}.*|table of contents)\s*$",
        )
        .expect("noise filter regex is a compile-time constant");
        Self {
            llm,
            chunk_mode_token_threshold,
            noise_filter,
        }
    }

    /// Deterministic regex-based filter for headers/page numbers/copyright
    /// notices (§4.9), applied before the text ever reaches the LLM.
    pub fn filter_noise(&self, text: &str) -> String {
        self.noise_filter
            .replace_all(text, "")
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn approximate_token_count(text: &str) -> usize {
        text.split_whitespace().count()
    }

    pub async fn extract(&self, text: &str) -> Result<ConceptMetadata, LlmError> {
        let filtered = self.filter_noise(text);
        let mode = if Self::approximate_token_count(&filtered) > self.chunk_mode_token_threshold {
            ExtractionMode::Chunk
        } else {
            ExtractionMode::SinglePass
        };

        let mut metadata = self.llm.extract_concepts(&filtered, mode).await?;
        dedupe_case_insensitive(&mut metadata);
        Ok(metadata)
    }
}

/// Primary concepts, categories, related concepts, and technical terms are
/// all deduplicated case-insensitively while preserving first-seen casing
/// (§4.9 "deduplicate primary concepts case-insensitively").
fn dedupe_case_insensitive(metadata: &mut ConceptMetadata) {
    let mut seen = std::collections::HashSet::new();
    metadata
        .primary_concepts
        .retain(|c| seen.insert(c.name.to_lowercase()));

    dedupe_strings(&mut metadata.categories);
    dedupe_strings(&mut metadata.related_concepts);
    dedupe_strings(&mut metadata.technical_terms);
}

fn dedupe_strings(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|s| seen.insert(s.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::MockLlmClient;
    use crate::types::PrimaryConcept;

    fn extractor_with(metadata: ConceptMetadata) -> ConceptExtractor {
        let mock = Arc::new(MockLlmClient {
            summary: String::new(),
            concepts: metadata,
        });
        ConceptExtractor::new(mock, 100_000)
    }

    #[test]
    fn filter_noise_strips_page_numbers_and_copyright() {
        let extractor = extractor_with(ConceptMetadata::default());
        let text = "Chapter One\nPage 3 of 10\nCopyright © 2024 Acme Corp\nActual content here.";
        let filtered = extractor.filter_noise(text);
        assert!(!filtered.contains("Page 3 of 10"));
        assert!(!filtered.to_lowercase().contains("copyright"));
        assert!(filtered.contains("Actual content here."));
    }

    #[tokio::test]
    async fn extract_dedupes_concepts_case_insensitively() {
        let metadata = ConceptMetadata {
            primary_concepts: vec![
                PrimaryConcept {
                    name: "API Gateway".to_string(),
                    summary: None,
                },
                PrimaryConcept {
                    name: "api gateway".to_string(),
                    summary: None,
                },
            ],
            categories: vec!["Networking".to_string(), "networking".to_string()],
            related_concepts: vec![],
            technical_terms: vec![],
            summary: String::new(),
        };
        let extractor = extractor_with(metadata);
        let result = extractor.extract("some document text").await.unwrap();
        assert_eq!(result.primary_concepts.len(), 1);
        assert_eq!(result.categories.len(), 1);
    }

    #[tokio::test]
    async fn large_document_uses_chunk_mode() {
        let metadata = ConceptMetadata::default();
        let extractor = extractor_with(metadata);
        let big_text = "word ".repeat(200_000);
        // The mock client ignores `mode`, so this just exercises the
        // threshold computation without panicking.
        assert!(extractor.extract(&big_text).await.is_ok());
    }
}
