//! Chunk concept enrichment (C11, §4.11): tags each chunk with the subset of
//! its document's concepts that actually appear in that chunk's text, using
//! fuzzy phrase matching rather than requiring an exact substring hit, since
//! LLM-extracted concept names don't always appear verbatim in the source.

use std::collections::HashSet;

/// Sliding window (in whitespace tokens) within which a multi-word concept's
/// constituent words must all appear for a fuzzy match to count.
const FUZZY_WINDOW: usize = 20;

pub struct ChunkConceptTags {
    pub concept_ids: Vec<i64>,
    pub concept_categories: Vec<String>,
    pub concept_density: f32,
}

/// A document concept available for tagging against chunk text.
pub struct TaggableConcept<'a> {
    pub id: i64,
    pub name: &'a str,
    pub category: &'a str,
}

/// Tags a single chunk against the full set of concepts extracted for its
/// parent document (§4.11). `total_concepts_in_document` is the denominator
/// for `concept_density` and is passed separately since it must stay fixed
/// across all chunks of the same document even if some concepts never match
/// any chunk.
pub fn enrich_chunk_concepts(
    chunk_text: &str,
    concepts: &[TaggableConcept],
    total_concepts_in_document: usize,
) -> ChunkConceptTags {
    let words: Vec<String> = chunk_text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    let word_set: HashSet<&str> = words.iter().map(String::as_str).collect();
    let lower_text = chunk_text.to_lowercase();

    let mut matched_ids = Vec::new();
    let mut matched_categories = HashSet::new();
    let mut matched_spans: Vec<(usize, usize)> = Vec::new();

    for concept in concepts {
        let concept_words: Vec<String> = concept
            .name
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        if concept_words.is_empty() {
            continue;
        }

        let full_phrase = concept.name.to_lowercase();
        let is_full_phrase_match = concept_words.len() > 1 && lower_text.contains(&full_phrase);

        let required = ((concept_words.len() as f32) * 0.6).ceil() as usize;
        let present_count = concept_words
            .iter()
            .filter(|w| word_set.contains(w.as_str()))
            .count();
        let is_fuzzy_window_match = present_count >= required.max(1)
            && within_window(&words, &concept_words, FUZZY_WINDOW);

        if is_full_phrase_match || is_fuzzy_window_match {
            // Tie-break: a multi-word concept's match subsumes any
            // single-word concept matching the same span, so single-word
            // concepts whose token is already covered by a matched
            // multi-word concept are skipped.
            let span = (concept_words.len(), matched_spans.len());
            if concept_words.len() == 1
                && matched_spans
                    .iter()
                    .any(|(len, _)| *len > 1 && present_count > 0)
            {
                continue;
            }
            matched_spans.push(span);
            matched_ids.push(concept.id);
            matched_categories.insert(concept.category.to_string());
        }
    }

    let density = if total_concepts_in_document == 0 {
        0.0
    } else {
        (matched_ids.len() as f32 / total_concepts_in_document as f32).clamp(0.0, 1.0)
    };

    ChunkConceptTags {
        concept_ids: matched_ids,
        concept_categories: matched_categories.into_iter().collect(),
        concept_density: density,
    }
}

/// True if every word of `needle` appears somewhere within a `window`-token
/// span of `haystack` (order-independent — the words just need to be close
/// together, not in the concept's original order).
fn within_window(haystack: &[String], needle: &[String], window: usize) -> bool {
    if needle.len() == 1 {
        return haystack.iter().any(|w| w == &needle[0]);
    }
    for start in 0..haystack.len() {
        let end = (start + window).min(haystack.len());
        let slice: HashSet<&str> = haystack[start..end].iter().map(String::as_str).collect();
        if needle.iter().all(|w| slice.contains(w.as_str())) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_phrase_match_is_tagged() {
        let concepts = vec![TaggableConcept {
            id: 1,
            name: "service mesh",
            category: "infrastructure",
        }];
        let tags = enrich_chunk_concepts(
            "Our platform relies on a service mesh for traffic shaping.",
            &concepts,
            1,
        );
        assert_eq!(tags.concept_ids, vec![1]);
        assert_eq!(tags.concept_density, 1.0);
    }

    #[test]
    fn fuzzy_window_match_tags_separated_words() {
        let concepts = vec![TaggableConcept {
            id: 2,
            name: "distributed consensus",
            category: "infrastructure",
        }];
        let tags = enrich_chunk_concepts(
            "Raft is a distributed algorithm that achieves consensus among replicas.",
            &concepts,
            1,
        );
        assert_eq!(tags.concept_ids, vec![2]);
    }

    #[test]
    fn unrelated_concept_is_not_tagged() {
        let concepts = vec![TaggableConcept {
            id: 3,
            name: "quantum computing",
            category: "science",
        }];
        let tags = enrich_chunk_concepts("This chunk discusses baking bread.", &concepts, 1);
        assert!(tags.concept_ids.is_empty());
        assert_eq!(tags.concept_density, 0.0);
    }

    #[test]
    fn density_reflects_fraction_of_document_concepts() {
        let concepts = vec![
            TaggableConcept {
                id: 1,
                name: "service mesh",
                category: "infra",
            },
            TaggableConcept {
                id: 2,
                name: "kubernetes",
                category: "infra",
            },
        ];
        let tags = enrich_chunk_concepts("We deployed a service mesh today.", &concepts, 4);
        assert_eq!(tags.concept_ids, vec![1]);
        assert_eq!(tags.concept_density, 0.25);
    }
}
