//! Hybrid search (C13, §4.13): combines vector similarity, BM25, title
//! matching, concept overlap, and query-expansion coverage into a single
//! weighted score. Rather than reciprocal-rank fusion over independently
//! scored result lists, every sub-score is computed directly against one
//! shared candidate set pulled from a single vector-search pass, using
//! fixed explicit weights per collection mode.

use crate::config::{HybridWeights, SearchConfig};
use crate::embeddings::EmbeddingModel;
use crate::error::ConceptRagError;
use crate::search::expander::{ExpandedQuery, QueryExpander};
use crate::storage::{Scored, StorageEngine};
use crate::types::{CatalogRow, ChunkRow};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SearchHit<T> {
    pub row: T,
    pub hybrid_score: f32,
    pub vector_score: f32,
    pub bm25_score: f32,
    pub title_score: f32,
    pub concept_score: f32,
    pub wordnet_score: f32,
}

pub struct HybridSearch {
    storage: Arc<StorageEngine>,
    embedder: Arc<dyn EmbeddingModel>,
    expander: QueryExpander,
    config: SearchConfig,
}

impl HybridSearch {
    pub fn new(
        storage: Arc<StorageEngine>,
        embedder: Arc<dyn EmbeddingModel>,
        expander: QueryExpander,
        config: SearchConfig,
    ) -> Self {
        Self {
            storage,
            embedder,
            expander,
            config,
        }
    }

    pub async fn search_catalog(
        &self,
        query: &str,
        k: usize,
        filter: Option<&str>,
    ) -> Result<Vec<SearchHit<CatalogRow>>, ConceptRagError> {
        let expanded = self.expander.expand(query).await;
        let query_vector = self.embedder.embed_query(query)?;
        let candidate_k = k * self.config.candidate_multiplier.max(1);
        let candidates = self
            .storage
            .vector_search_catalog(&query_vector, candidate_k, filter)
            .await?;

        let mut hits: Vec<SearchHit<CatalogRow>> = candidates
            .into_iter()
            .map(|Scored { row, score }| {
                let bm25 = bm25_score(&row.text, &row.source, &expanded, &self.config);
                let title = title_score(&row.source, &expanded);
                let concept = concept_score_catalog(&row, &expanded);
                let wordnet = wordnet_score(&row.text, &expanded);
                let hybrid = weighted_sum(
                    &self.config.catalog_weights,
                    score,
                    bm25,
                    title,
                    concept,
                    wordnet,
                );
                SearchHit {
                    row,
                    hybrid_score: hybrid,
                    vector_score: score,
                    bm25_score: bm25,
                    title_score: title,
                    concept_score: concept,
                    wordnet_score: wordnet,
                }
            })
            .collect();

        sort_and_truncate(&mut hits, k);
        Ok(hits)
    }

    pub async fn search_chunks(
        &self,
        query: &str,
        k: usize,
        filter: Option<&str>,
    ) -> Result<Vec<SearchHit<ChunkRow>>, ConceptRagError> {
        let expanded = self.expander.expand(query).await;
        let query_vector = self.embedder.embed_query(query)?;
        let candidate_k = k * self.config.candidate_multiplier.max(1);
        let candidates = self
            .storage
            .vector_search_chunks(&query_vector, candidate_k, filter)
            .await?;

        let mut hits: Vec<SearchHit<ChunkRow>> = candidates
            .into_iter()
            .map(|Scored { row, score }| {
                let bm25 = bm25_score(&row.text, "", &expanded, &self.config);
                // Chunks have no independent title; fuzzy-match the parent
                // document's source path fragment against expansion terms
                // only if a heading is present, else 0 (§4.13 chunk mode
                // weight for title is already reduced to compensate).
                let title = row
                    .loc
                    .heading
                    .as_deref()
                    .map(|h| title_score(h, &expanded))
                    .unwrap_or(0.0);
                let concept = concept_density_score(row.concept_density, &expanded);
                let wordnet = wordnet_score(&row.text, &expanded);
                let hybrid = weighted_sum(
                    &self.config.chunk_weights,
                    score,
                    bm25,
                    title,
                    concept,
                    wordnet,
                );
                SearchHit {
                    row,
                    hybrid_score: hybrid,
                    vector_score: score,
                    bm25_score: bm25,
                    title_score: title,
                    concept_score: concept,
                    wordnet_score: wordnet,
                }
            })
            .collect();

        sort_and_truncate(&mut hits, k);
        Ok(hits)
    }
}

fn weighted_sum(
    weights: &HybridWeights,
    vector: f32,
    bm25: f32,
    title: f32,
    concept: f32,
    wordnet: f32,
) -> f32 {
    weights.vector * vector
        + weights.bm25 * bm25
        + weights.title * title
        + weights.concept * concept
        + weights.wordnet * wordnet
}

fn sort_and_truncate<T>(hits: &mut Vec<SearchHit<T>>, k: usize) {
    hits.sort_by(|a, b| {
        b.hybrid_score
            .partial_cmp(&a.hybrid_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.vector_score
                    .partial_cmp(&a.vector_score)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
    hits.truncate(k);
}

/// Okapi BM25 over the expanded query's term set against `text ⧺ source`,
/// using the config's fixed k1/b/avg_doc_length instead of corpus-wide IDF
/// statistics (§4.13: no inverted index is maintained, term frequency is
/// computed directly against candidate text). Term matching is fuzzy
/// substring containment in either direction, not exact word equality, so
/// "gateway" still credits a document whose text only says "gateways".
fn bm25_score(text: &str, source: &str, expanded: &ExpandedQuery, config: &SearchConfig) -> f32 {
    if expanded.all_terms.is_empty() {
        return 0.0;
    }
    let combined = format!("{text} {source}");
    let words: Vec<String> = combined
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    let doc_length = words.len().max(1) as f32;

    let k1 = config.bm25_k1;
    let b = config.bm25_b;
    let avg_len = config.bm25_avg_doc_length.max(1.0);

    let mut weighted_sum = 0.0f32;
    let mut weight_total = 0.0f32;
    for term in &expanded.all_terms {
        let weight = expanded.weights.get(term).copied().unwrap_or(1.0);
        weight_total += weight;

        let freq = words
            .iter()
            .filter(|w| w.contains(term.as_str()) || term.contains(w.as_str()))
            .count() as f32;
        if freq == 0.0 {
            continue;
        }
        let numerator = freq * (k1 + 1.0);
        let denominator = freq + k1 * (1.0 - b + b * (doc_length / avg_len));
        weighted_sum += weight * (numerator / denominator);
    }

    if weight_total <= 0.0 {
        0.0
    } else {
        (weighted_sum / weight_total).min(1.0)
    }
}

fn title_score(source: &str, expanded: &ExpandedQuery) -> f32 {
    let basename = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source)
        .to_lowercase()
        .replace(['_', '-'], " ");
    if expanded.original_terms.is_empty() {
        return 0.0;
    }
    let matched = expanded
        .original_terms
        .iter()
        .filter(|t| basename.contains(t.as_str()))
        .count();
    (matched as f32 / expanded.original_terms.len() as f32).clamp(0.0, 1.0)
}

/// Fuzzy substring match of every expansion term (original, corpus-derived,
/// and thesaurus alike) against the document's primary concepts, weighted
/// by each term's expansion weight and normalized by the total expansion
/// weight (§4.13).
fn concept_score_catalog(row: &CatalogRow, expanded: &ExpandedQuery) -> f32 {
    if expanded.all_terms.is_empty() || row.concepts.primary_concepts.is_empty() {
        return 0.0;
    }
    let doc_concepts: Vec<String> = row
        .concepts
        .primary_concepts
        .iter()
        .map(|c| c.name.to_lowercase())
        .collect();

    let mut matched_weight = 0.0f32;
    let mut weight_total = 0.0f32;
    for term in &expanded.all_terms {
        let weight = expanded.weights.get(term).copied().unwrap_or(1.0);
        weight_total += weight;
        let hit = doc_concepts
            .iter()
            .any(|c| c.contains(term.as_str()) || term.contains(c.as_str()));
        if hit {
            matched_weight += weight;
        }
    }

    if weight_total <= 0.0 {
        0.0
    } else {
        (matched_weight / weight_total).min(1.0)
    }
}

fn concept_density_score(concept_density: f32, expanded: &ExpandedQuery) -> f32 {
    if expanded.corpus_terms.is_empty() {
        return 0.0;
    }
    concept_density.clamp(0.0, 1.0)
}

fn wordnet_score(text: &str, expanded: &ExpandedQuery) -> f32 {
    if expanded.wordnet_terms.is_empty() {
        return 0.0;
    }
    let lower = text.to_lowercase();
    let matched = expanded
        .wordnet_terms
        .iter()
        .filter(|t| lower.contains(t.as_str()))
        .count();
    (matched as f32 / expanded.wordnet_terms.len() as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::expander::ExpandedQuery;
    use std::collections::HashMap;

    fn expanded_with(terms: &[&str]) -> ExpandedQuery {
        let mut weights = HashMap::new();
        for t in terms {
            weights.insert(t.to_string(), 1.0);
        }
        ExpandedQuery {
            original_terms: terms.iter().map(|s| s.to_string()).collect(),
            corpus_terms: vec![],
            wordnet_terms: vec![],
            all_terms: terms.iter().map(|s| s.to_string()).collect(),
            weights,
        }
    }

    #[test]
    fn bm25_scores_zero_with_no_expansion_terms() {
        let config = SearchConfig {
            default_k: 10,
            candidate_multiplier: 3,
            catalog_weights: HybridWeights {
                vector: 0.25,
                bm25: 0.25,
                title: 0.2,
                concept: 0.2,
                wordnet: 0.1,
            },
            chunk_weights: HybridWeights {
                vector: 0.35,
                bm25: 0.35,
                title: 0.05,
                concept: 0.1,
                wordnet: 0.15,
            },
            bm25_k1: 1.5,
            bm25_b: 0.75,
            bm25_avg_doc_length: 100.0,
            min_vectors_for_index: 256,
        };
        let expanded = ExpandedQuery::default();
        assert_eq!(bm25_score("some text here", "", &expanded, &config), 0.0);
    }

    #[test]
    fn bm25_prefers_higher_term_frequency() {
        let config = SearchConfig {
            default_k: 10,
            candidate_multiplier: 3,
            catalog_weights: HybridWeights {
                vector: 0.25,
                bm25: 0.25,
                title: 0.2,
                concept: 0.2,
                wordnet: 0.1,
            },
            chunk_weights: HybridWeights {
                vector: 0.35,
                bm25: 0.35,
                title: 0.05,
                concept: 0.1,
                wordnet: 0.15,
            },
            bm25_k1: 1.5,
            bm25_b: 0.75,
            bm25_avg_doc_length: 100.0,
            min_vectors_for_index: 256,
        };
        let expanded = expanded_with(&["database"]);
        let low = bm25_score("a document about database systems", "", &expanded, &config);
        let high = bm25_score(
            "database database database systems for database workloads",
            "",
            &expanded,
            &config,
        );
        assert!(high > low);
    }

    #[test]
    fn title_score_matches_basename_tokens() {
        let expanded = expanded_with(&["rust", "programming"]);
        let score = title_score("/docs/rust-programming-guide.pdf", &expanded);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn title_score_zero_when_basename_unrelated() {
        let expanded = expanded_with(&["rust", "programming"]);
        let score = title_score("/docs/cooking-recipes.pdf", &expanded);
        assert_eq!(score, 0.0);
    }
}
