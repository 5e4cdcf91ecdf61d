//! Data model — the four persistent tables described in spec §3, plus the
//! document-loader and concept-extraction value types that feed them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `concept_type` discriminator (§3 `concepts` table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConceptType {
    Thematic,
    Terminology,
}

/// `enrichment_source` discriminator (§3 `concepts` table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentSource {
    Corpus,
    Wordnet,
    Hybrid,
}

/// `catalog` row (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRow {
    pub id: i64,
    pub source: String,
    pub hash: String,
    pub text: String,
    pub concepts: ConceptMetadata,
    pub concept_categories: Vec<String>,
    pub loc: DocumentLoc,
    pub vector: Vec<f32>,
}

/// `chunks` row (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRow {
    pub id: i64,
    pub catalog_id: i64,
    pub text: String,
    pub hash: String,
    pub loc: ChunkLoc,
    pub concept_ids: Vec<i64>,
    pub concept_categories: Vec<String>,
    pub concept_density: f32,
    pub vector: Vec<f32>,
}

/// `concepts` row (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptRow {
    pub id: i64,
    pub concept: String,
    pub concept_type: ConceptType,
    pub category: String,
    pub sources: Vec<String>,
    pub catalog_ids: Vec<i64>,
    pub related_concepts: Vec<String>,
    pub synonyms: Vec<String>,
    pub broader_terms: Vec<String>,
    pub narrower_terms: Vec<String>,
    pub weight: f32,
    pub chunk_count: u32,
    pub enrichment_source: EnrichmentSource,
    pub vector: Vec<f32>,
}

/// `categories` row (§3, derived).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub alias: String,
    pub parent_id: Option<i64>,
    pub document_count: u32,
    pub concept_count: u32,
}

/// `catalog.loc` — page-range metadata for a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentLoc {
    pub page_count: usize,
    pub page_ranges: Vec<(usize, usize)>,
}

/// `chunks.loc` — where within the parent document a chunk came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkLoc {
    pub page_number: Option<usize>,
    pub start_offset: usize,
    pub end_offset: usize,
    pub heading: Option<String>,
}

/// A single extracted primary concept. The LLM may return either a bare
/// string or `{name, summary}` (§4.4) — both normalize to this shape.
#[derive(Debug, Clone, Serialize)]
pub struct PrimaryConcept {
    pub name: String,
    pub summary: Option<String>,
}

impl<'de> Deserialize<'de> for PrimaryConcept {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Named { name: String, summary: Option<String> },
            Bare(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Named { name, summary } => Ok(PrimaryConcept { name, summary }),
            Repr::Bare(name) => Ok(PrimaryConcept {
                name,
                summary: None,
            }),
        }
    }
}

/// Output of the concept extractor (C9) / `extract_concepts` (C4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConceptMetadata {
    #[serde(default)]
    pub primary_concepts: Vec<PrimaryConcept>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub related_concepts: Vec<String>,
    #[serde(default)]
    pub technical_terms: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

/// Extraction mode for C9, keyed to the >100k-token chunk-mode split (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    SinglePass,
    Chunk,
}

/// A page of document text as produced by the document loader (C7).
#[derive(Debug, Clone)]
pub struct Page {
    pub text: String,
    pub page_number: usize,
    pub metadata: HashMap<String, String>,
}

/// Structured section extracted from a document (table), used to build
/// higher-quality chunks than a pure sliding window would.
#[derive(Debug, Clone)]
pub enum DocumentSection {
    Text {
        content: String,
        page: usize,
        heading: Option<String>,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        page: usize,
        caption: Option<String>,
    },
}

/// Completeness classification for a single document hash (C8, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessRecord {
    pub has_record: bool,
    pub has_summary: bool,
    pub has_concepts: bool,
    pub has_chunks: bool,
    pub chunks_lack_concept_tags: bool,
    pub is_complete: bool,
    pub missing_components: Vec<MissingComponent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingComponent {
    Catalog,
    Summary,
    Concepts,
    Chunks,
    ChunkConcepts,
    Categories,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_concept_accepts_bare_string() {
        let v: PrimaryConcept = serde_json::from_str("\"API Gateway\"").unwrap();
        assert_eq!(v.name, "API Gateway");
        assert!(v.summary.is_none());
    }

    #[test]
    fn primary_concept_accepts_named_object() {
        let v: PrimaryConcept =
            serde_json::from_str(r#"{"name":"API Gateway","summary":"a pattern"}"#).unwrap();
        assert_eq!(v.name, "API Gateway");
        assert_eq!(v.summary.as_deref(), Some("a pattern"));
    }

    #[test]
    fn concept_metadata_defaults_missing_fields() {
        let v: ConceptMetadata = serde_json::from_str(r#"{"primary_concepts":["x"]}"#).unwrap();
        assert_eq!(v.primary_concepts.len(), 1);
        assert!(v.categories.is_empty());
    }
}
