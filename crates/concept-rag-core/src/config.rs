//! Configuration (ambient stack): a `Default` baseline, JSON file overlay
//! via `from_file`, and a `validate()` pass that rejects clearly-broken
//! values before anything opens a table or calls out to an LLM.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptRagConfig {
    pub db_path: PathBuf,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub search: SearchConfig,
    pub ingest: IngestConfig,
    pub llm: LlmConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub dimension: usize,
    pub remote_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    Hash,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Suggested chunk policy from spec §9 "Open questions": ~500 chars,
    /// ~50-char overlap, split on sentence boundaries when possible.
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_k: usize,
    /// Candidates fetched per top-k result = `candidate_multiplier * k` (§4.13 step 3).
    pub candidate_multiplier: usize,
    /// §4.13 step 5 weights, catalog mode: (vector, bm25, title, concept, wordnet).
    pub catalog_weights: HybridWeights,
    /// §4.13 step 5, chunk mode: title/concept reduced since chunks lack titles.
    pub chunk_weights: HybridWeights,
    /// BM25 k1/b (§4.13).
    pub bm25_k1: f32,
    pub bm25_b: f32,
    pub bm25_avg_doc_length: f32,
    /// Minimum vector count before an ANN index is built (§4.2 / B2).
    pub min_vectors_for_index: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HybridWeights {
    pub vector: f32,
    pub bm25: f32,
    pub title: f32,
    pub concept: f32,
    pub wordnet: f32,
}

impl HybridWeights {
    pub fn sum(&self) -> f32 {
        self.vector + self.bm25 + self.title + self.concept + self.wordnet
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub workers: usize,
    pub max_docs: Option<usize>,
    pub ocr_doc_timeout_secs: u64,
    pub ocr_page_timeout_secs: u64,
    /// §4.9: documents with more than this many (approximate) tokens are
    /// extracted in chunk mode instead of single-pass.
    pub chunk_mode_token_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key_env: String,
    pub model: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub request_timeout_secs: u64,
    pub summary_prompt_path: Option<PathBuf>,
    pub concepts_prompt_path: Option<PathBuf>,
    pub concepts_chunked_prompt_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_days: u64,
}

impl ConceptRagConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.embedding.dimension != 384 {
            return Err("embedding.dimension must be 384 (spec invariant I1)".into());
        }
        if self.chunking.chunk_size < 50 {
            return Err("chunking.chunk_size must be >= 50".into());
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err("chunking.chunk_overlap must be < chunk_size".into());
        }
        if self.search.default_k == 0 {
            return Err("search.default_k must be > 0".into());
        }
        if self.search.candidate_multiplier == 0 {
            return Err("search.candidate_multiplier must be > 0".into());
        }
        for (label, w) in [
            ("catalog_weights", &self.search.catalog_weights),
            ("chunk_weights", &self.search.chunk_weights),
        ] {
            if (w.sum() - 1.0).abs() > 1e-3 {
                return Err(format!("search.{label} must sum to 1.0, got {}", w.sum()));
            }
        }
        if self.ingest.workers == 0 {
            return Err("ingest.workers must be > 0".into());
        }
        if self.llm.max_retries == 0 {
            return Err("llm.max_retries must be > 0".into());
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overlays per spec §6 ("Environment").
    /// CLI flags should be applied after this (CLI wins).
    pub fn apply_env_overlay(&mut self) {
        if let Ok(db) = std::env::var("CONCEPT_RAG_DB") {
            self.db_path = PathBuf::from(db);
        }
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            match provider.as_str() {
                "hash" => self.embedding.provider = EmbeddingProviderKind::Hash,
                "remote" => self.embedding.provider = EmbeddingProviderKind::Remote,
                other => tracing::warn!(provider = %other, "unknown EMBEDDING_PROVIDER, keeping configured value"),
            }
        }
        if let Ok(model) = std::env::var("CONCEPT_RAG_LLM_MODEL") {
            self.llm.model = model;
        }
    }
}

impl Default for ConceptRagConfig {
    fn default() -> Self {
        let db_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".concept_rag");

        Self {
            db_path,
            embedding: EmbeddingConfig {
                provider: EmbeddingProviderKind::Hash,
                dimension: 384,
                remote_endpoint: None,
            },
            chunking: ChunkingConfig {
                chunk_size: 500,
                chunk_overlap: 50,
                min_chunk_size: 100,
            },
            search: SearchConfig {
                default_k: 10,
                candidate_multiplier: 3,
                catalog_weights: HybridWeights {
                    vector: 0.25,
                    bm25: 0.25,
                    title: 0.20,
                    concept: 0.20,
                    wordnet: 0.10,
                },
                chunk_weights: HybridWeights {
                    vector: 0.35,
                    bm25: 0.35,
                    title: 0.05,
                    concept: 0.10,
                    wordnet: 0.15,
                },
                bm25_k1: 1.5,
                bm25_b: 0.75,
                bm25_avg_doc_length: 100.0,
                min_vectors_for_index: 256,
            },
            ingest: IngestConfig {
                workers: 4,
                max_docs: None,
                ocr_doc_timeout_secs: 600,
                ocr_page_timeout_secs: 60,
                chunk_mode_token_threshold: 100_000,
            },
            llm: LlmConfig {
                endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
                api_key_env: "OPENROUTER_API_KEY".to_string(),
                model: "anthropic/claude-3-haiku".to_string(),
                max_retries: 3,
                backoff_base_ms: 200,
                request_timeout_secs: 120,
                summary_prompt_path: None,
                concepts_prompt_path: None,
                concepts_chunked_prompt_path: None,
            },
            cache: CacheConfig { ttl_days: 7 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(ConceptRagConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_384_dimension() {
        let mut cfg = ConceptRagConfig::default();
        cfg.embedding.dimension = 256;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_overlap_ge_chunk_size() {
        let mut cfg = ConceptRagConfig::default();
        cfg.chunking.chunk_overlap = cfg.chunking.chunk_size;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let mut cfg = ConceptRagConfig::default();
        cfg.search.catalog_weights.vector = 0.9;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_overlay_overrides_db_path() {
        std::env::set_var("CONCEPT_RAG_DB", "/tmp/custom-db");
        let mut cfg = ConceptRagConfig::default();
        cfg.apply_env_overlay();
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/custom-db"));
        std::env::remove_var("CONCEPT_RAG_DB");
    }
}
