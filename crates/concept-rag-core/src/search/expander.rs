//! Query expansion (C12, §4.12): widens a raw query with corpus-derived
//! concept terms and thesaurus terms before hybrid search scores candidates,
//! so a query for "db" also pulls in "database"/"datastore" matches.

use crate::search::thesaurus::ThesaurusLookup;
use crate::storage::StorageEngine;
use std::collections::HashMap;
use std::sync::Arc;

/// Terms shorter than this are too ambiguous to expand (§4.12: "terms of
/// length >= 3").
const MIN_EXPANDABLE_LEN: usize = 3;

/// Cap on total expansion terms kept, by descending weight (§4.12 "~30").
const MAX_EXPANSION_TERMS: usize = 30;

const CONCEPT_EXACT_WEIGHT: f32 = 1.0;
const CONCEPT_RELATED_WEIGHT: f32 = 0.6;
const THESAURUS_SYNONYM_WEIGHT: f32 = 0.5;
const THESAURUS_HYPERNYM_WEIGHT: f32 = 0.4;

#[derive(Debug, Clone, Default)]
pub struct ExpandedQuery {
    pub original_terms: Vec<String>,
    pub corpus_terms: Vec<String>,
    pub wordnet_terms: Vec<String>,
    pub all_terms: Vec<String>,
    pub weights: HashMap<String, f32>,
}

pub struct QueryExpander {
    storage: Arc<StorageEngine>,
    thesaurus: Arc<dyn ThesaurusLookup>,
}

impl QueryExpander {
    pub fn new(storage: Arc<StorageEngine>, thesaurus: Arc<dyn ThesaurusLookup>) -> Self {
        Self { storage, thesaurus }
    }

    pub async fn expand(&self, query: &str) -> ExpandedQuery {
        let original_terms: Vec<String> = tokenize(query);

        let mut weights: HashMap<String, f32> = HashMap::new();
        for term in &original_terms {
            bump(&mut weights, term, 1.0);
        }

        let mut corpus_terms = Vec::new();
        let mut wordnet_terms = Vec::new();

        for term in &original_terms {
            if term.len() < MIN_EXPANDABLE_LEN {
                continue;
            }

            if let Ok(matches) = self.lookup_concepts(term).await {
                for (name, is_exact) in matches {
                    let weight = if is_exact {
                        CONCEPT_EXACT_WEIGHT
                    } else {
                        CONCEPT_RELATED_WEIGHT
                    };
                    bump(&mut weights, &name, weight);
                    corpus_terms.push(name);
                }
            }

            if let Some(entry) = self.thesaurus.lookup(term) {
                for syn in &entry.synonyms {
                    bump(&mut weights, syn, THESAURUS_SYNONYM_WEIGHT);
                    wordnet_terms.push(syn.clone());
                }
                for hyper in &entry.hypernyms {
                    bump(&mut weights, hyper, THESAURUS_HYPERNYM_WEIGHT);
                    wordnet_terms.push(hyper.clone());
                }
            }
        }

        dedupe(&mut corpus_terms);
        dedupe(&mut wordnet_terms);

        let mut ranked: Vec<(String, f32)> = weights.iter().map(|(k, v)| (k.clone(), *v)).collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(MAX_EXPANSION_TERMS.max(original_terms.len()));

        let all_terms: Vec<String> = ranked.iter().map(|(t, _)| t.clone()).collect();
        let weights: HashMap<String, f32> = ranked.into_iter().collect();

        ExpandedQuery {
            original_terms,
            corpus_terms,
            wordnet_terms,
            all_terms,
            weights,
        }
    }

    /// Returns `(concept_name, is_exact_match)` pairs: exact matches on the
    /// concept name itself, plus that concept's related_concepts at a lower
    /// weight (§4.12).
    async fn lookup_concepts(
        &self,
        term: &str,
    ) -> Result<Vec<(String, bool)>, crate::error::StorageError> {
        let rows = self.storage.scan_concepts(None, None).await?;
        let mut out = Vec::new();
        for row in rows {
            let lower = row.concept.to_lowercase();
            if lower == term || lower.starts_with(term) {
                out.push((row.concept.clone(), true));
                for related in &row.related_concepts {
                    out.push((related.clone(), false));
                }
            }
        }
        Ok(out)
    }
}

fn bump(weights: &mut HashMap<String, f32>, term: &str, value: f32) {
    let entry = weights.entry(term.to_lowercase()).or_insert(0.0);
    if value > *entry {
        *entry = value;
    }
}

fn tokenize(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn dedupe(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|s| seen.insert(s.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_strips_punctuation_and_lowercases() {
        let terms = tokenize("What is a Service-Mesh?");
        assert_eq!(terms, vec!["what", "is", "a", "service-mesh"]);
    }

    #[test]
    fn bump_keeps_the_higher_weight() {
        let mut weights = HashMap::new();
        bump(&mut weights, "term", 0.5);
        bump(&mut weights, "term", 1.0);
        bump(&mut weights, "term", 0.2);
        assert_eq!(weights.get("term"), Some(&1.0));
    }

    #[test]
    fn dedupe_is_case_insensitive() {
        let mut items = vec!["Database".to_string(), "database".to_string()];
        dedupe(&mut items);
        assert_eq!(items.len(), 1);
    }
}
