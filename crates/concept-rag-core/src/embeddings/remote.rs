//! Remote embedding provider (§4.1 "Remote" alternative): a plain HTTP POST
//! to an embedding service, `{"input": [text]}` in, `{"embedding": [f32]}`
//! out. The `EmbeddingModel` trait is synchronous, so this uses
//! `reqwest::blocking` rather than dragging the whole call chain onto an
//! async runtime for what is, from the caller's perspective, one
//! request/response pair.

use super::EmbeddingModel;
use crate::error::{ConceptRagError, LlmError, LlmErrorCategory};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct RemoteEmbedder {
    endpoint: String,
    dimension: usize,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    pub fn new(endpoint: String, dimension: usize) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client builds with default TLS backend");
        Self {
            endpoint,
            dimension,
            client,
        }
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ConceptRagError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { input: text })
            .send()
            .map_err(|e| {
                LlmError::Transient {
                    category: LlmErrorCategory::Timeout,
                    message: e.to_string(),
                }
            })?;

        if !response.status().is_success() {
            return Err(LlmError::Permanent {
                category: LlmErrorCategory::BadRequest,
                message: format!("embedding service returned {}", response.status()),
            }
            .into());
        }

        let parsed: EmbedResponse = response
            .json()
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        if parsed.embedding.len() != self.dimension {
            return Err(LlmError::MalformedResponse(format!(
                "expected {}-dim embedding, got {}",
                self.dimension,
                parsed.embedding.len()
            ))
            .into());
        }

        Ok(parsed.embedding)
    }
}

impl EmbeddingModel for RemoteEmbedder {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, ConceptRagError> {
        self.embed(text)
    }

    fn embed_document(&self, text: &str) -> Result<Vec<f32>, ConceptRagError> {
        self.embed(text)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
