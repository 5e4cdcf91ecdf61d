//! Concept indexer (C10, §4.10): runs after chunk writes are flushed,
//! aggregates per-document concept extractions into the global `concepts`
//! table, and re-derives `categories`. Must run after chunks (I4:
//! `chunk_count` correctness) — the checkpoint `stage` field is what
//! enforces that ordering at the call site (see `cache::checkpoint::Stage`).

use crate::embeddings::EmbeddingModel;
use crate::error::ConceptRagError;
use crate::ids;
use crate::search::thesaurus::ThesaurusLookup;
use crate::storage::StorageEngine;
use crate::types::{CategoryRow, ConceptRow, ConceptType, EnrichmentSource};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Weight formula denominator (Open Question resolution, SPEC_FULL.md):
/// `weight = min(1, ln(1+mentions) * ln(1+sources) / K)`, chosen so a
/// concept needs roughly 8 mentions across 3 distinct sources (or the
/// reverse) to saturate at 1.0.
const WEIGHT_K: f32 = 4.0;

struct Aggregate {
    display_name: String,
    concept_type: ConceptType,
    category: String,
    sources: HashSet<String>,
    catalog_ids: HashSet<i64>,
    related_concepts: HashSet<String>,
    mentions: u32,
}

pub struct ConceptIndexer {
    storage: Arc<StorageEngine>,
    embedder: Arc<dyn EmbeddingModel>,
    thesaurus: Arc<dyn ThesaurusLookup>,
}

impl ConceptIndexer {
    pub fn new(
        storage: Arc<StorageEngine>,
        embedder: Arc<dyn EmbeddingModel>,
        thesaurus: Arc<dyn ThesaurusLookup>,
    ) -> Self {
        Self {
            storage,
            embedder,
            thesaurus,
        }
    }

    pub async fn run(&self) -> Result<(), ConceptRagError> {
        let catalog_rows = self.storage.scan_catalog(None, None).await?;
        let mut aggregates: HashMap<String, Aggregate> = HashMap::new();

        for row in &catalog_rows {
            for concept in &row.concepts.primary_concepts {
                let canonical = ids::canonicalize_concept(&concept.name);
                let entry = aggregates.entry(canonical).or_insert_with(|| Aggregate {
                    display_name: concept.name.clone(),
                    concept_type: ConceptType::Thematic,
                    category: row
                        .concepts
                        .categories
                        .first()
                        .cloned()
                        .unwrap_or_else(|| "uncategorized".to_string()),
                    sources: HashSet::new(),
                    catalog_ids: HashSet::new(),
                    related_concepts: HashSet::new(),
                    mentions: 0,
                });
                entry.sources.insert(row.source.clone());
                entry.catalog_ids.insert(row.id);
                entry.mentions += 1;
                for related in &row.concepts.related_concepts {
                    entry.related_concepts.insert(related.clone());
                }
            }
            for term in &row.concepts.technical_terms {
                let canonical = ids::canonicalize_concept(term);
                let entry = aggregates.entry(canonical).or_insert_with(|| Aggregate {
                    display_name: term.clone(),
                    concept_type: ConceptType::Terminology,
                    category: "terminology".to_string(),
                    sources: HashSet::new(),
                    catalog_ids: HashSet::new(),
                    related_concepts: HashSet::new(),
                    mentions: 0,
                });
                entry.sources.insert(row.source.clone());
                entry.catalog_ids.insert(row.id);
                entry.mentions += 1;
            }
        }

        let chunk_rows = self.storage.scan_chunks(None, None).await?;
        let mut chunk_counts: HashMap<i64, u32> = HashMap::new();
        for chunk in &chunk_rows {
            for concept_id in &chunk.concept_ids {
                *chunk_counts.entry(*concept_id).or_insert(0) += 1;
            }
        }

        // I7: a document credits every category it declares, not just the
        // first one a concept happened to attach to it under. Derived
        // directly from `catalog.concept_categories` membership rather than
        // from each concept aggregate's single `category` field.
        let mut category_doc_counts: HashMap<String, HashSet<i64>> = HashMap::new();
        for row in &catalog_rows {
            for category in &row.concept_categories {
                category_doc_counts
                    .entry(category.clone())
                    .or_default()
                    .insert(row.id);
            }
        }

        let mut concept_rows = Vec::with_capacity(aggregates.len());
        let mut category_concept_counts: HashMap<String, u32> = HashMap::new();

        for (canonical, agg) in aggregates {
            let id = ids::concept_id(&canonical);
            let weight = concept_weight(agg.mentions, agg.sources.len() as u32);
            let vector = self.embedder.embed_document(&agg.display_name)?;

            let (synonyms, broader_terms, narrower_terms, enrichment_source) =
                match self.thesaurus.lookup(&canonical) {
                    Some(entry) if !entry.synonyms.is_empty() || !entry.hypernyms.is_empty() => (
                        entry.synonyms,
                        entry.hypernyms,
                        entry.hyponyms,
                        if agg.related_concepts.is_empty() {
                            EnrichmentSource::Wordnet
                        } else {
                            EnrichmentSource::Hybrid
                        },
                    ),
                    _ => (Vec::new(), Vec::new(), Vec::new(), EnrichmentSource::Corpus),
                };

            *category_concept_counts.entry(agg.category.clone()).or_insert(0) += 1;

            concept_rows.push(ConceptRow {
                id,
                concept: agg.display_name,
                concept_type: agg.concept_type,
                category: agg.category,
                sources: agg.sources.into_iter().collect(),
                catalog_ids: agg.catalog_ids.into_iter().collect(),
                related_concepts: agg.related_concepts.into_iter().collect(),
                synonyms,
                broader_terms,
                narrower_terms,
                weight,
                chunk_count: chunk_counts.get(&id).copied().unwrap_or(0),
                enrichment_source,
                vector,
            });
        }

        self.storage.delete_where("concepts", "id >= 0").await?;
        self.storage.insert_concepts(&concept_rows).await?;

        let category_rows: Vec<CategoryRow> = category_doc_counts
            .into_iter()
            .map(|(name, docs)| CategoryRow {
                id: ids::category_id(&name),
                alias: name.to_lowercase().replace(' ', "-"),
                document_count: docs.len() as u32,
                concept_count: category_concept_counts.get(&name).copied().unwrap_or(0),
                name,
                parent_id: None,
            })
            .collect();

        self.storage.delete_where("categories", "id >= 0").await?;
        self.storage.insert_categories(&category_rows).await?;

        Ok(())
    }
}

fn concept_weight(mentions: u32, sources: u32) -> f32 {
    let raw = (1.0 + mentions as f32).ln() * (1.0 + sources as f32).ln() / WEIGHT_K;
    raw.min(1.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_is_bounded_in_zero_one() {
        assert!(concept_weight(0, 0) >= 0.0);
        assert!(concept_weight(10_000, 10_000) <= 1.0);
    }

    #[test]
    fn weight_increases_with_mentions_and_sources() {
        let low = concept_weight(1, 1);
        let high = concept_weight(8, 3);
        assert!(high > low);
    }

    #[test]
    fn single_mention_single_source_is_low_weight() {
        assert!(concept_weight(1, 1) < 0.2);
    }
}
