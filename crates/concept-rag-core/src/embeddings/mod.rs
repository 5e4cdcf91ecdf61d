//! Embedding providers (C1). `EmbeddingModel` exposes query/document
//! variants, a batch helper, and `dimension()`; two providers implement
//! it: a deterministic hash embedder (default, no external calls) and an
//! HTTP-backed remote embedder.

pub mod hash;
pub mod remote;

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::error::ConceptRagError;
use std::sync::Arc;

/// Unified embedding model trait.
pub trait EmbeddingModel: Send + Sync {
    /// Embed a search query.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, ConceptRagError>;

    /// Embed a document/passage.
    fn embed_document(&self, text: &str) -> Result<Vec<f32>, ConceptRagError>;

    /// Batch embed documents for ingestion.
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ConceptRagError> {
        texts.iter().map(|t| self.embed_document(t)).collect()
    }

    /// Embedding vector dimension (I1: must be 384).
    fn dimension(&self) -> usize;
}

/// Build the configured embedding provider (§4.1 "pluggable via config").
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingModel>, ConceptRagError> {
    match config.provider {
        EmbeddingProviderKind::Hash => Ok(Arc::new(hash::HashEmbedder::new(config.dimension))),
        EmbeddingProviderKind::Remote => {
            let endpoint = config.remote_endpoint.clone().ok_or_else(|| {
                crate::error::ValidationError::MissingField {
                    field: "embedding.remote_endpoint".to_string(),
                }
            })?;
            Ok(Arc::new(remote::RemoteEmbedder::new(
                endpoint,
                config.dimension,
            )))
        }
    }
}
