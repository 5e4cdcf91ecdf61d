//! `concept_search`, `concept_chunks`, `source_concepts`, `extract_concepts` (§4.14).

use crate::ids;
use crate::storage::StorageEngine;
use crate::tools::{optional_usize, require_str, Tool, ToolResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 20;

#[derive(Serialize)]
struct ConceptDto {
    id: i64,
    concept: String,
    category: String,
    weight: f32,
    chunk_count: u32,
    sources: Vec<String>,
}

#[derive(Serialize)]
struct ConceptChunkDto {
    id: i64,
    catalog_id: i64,
    text: String,
    concept_density: f32,
}

/// Chunks tagged with any concept matching `concept`, ranked by
/// `concept_density` descending. `fuzzy`: substring match against every
/// concept's display name (used by `concept_search`, which takes a
/// human-typed name); otherwise the canonical form of `concept` must match
/// a concept's id exactly (used by `concept_chunks`, which expects the
/// canonical concept name).
async fn chunks_tagged_with(
    storage: &StorageEngine,
    concept: &str,
    limit: usize,
    fuzzy: bool,
) -> Result<Vec<ConceptChunkDto>, crate::error::StorageError> {
    let matching_ids: Vec<i64> = if fuzzy {
        let needle = concept.to_lowercase();
        storage
            .scan_concepts(None, None)
            .await?
            .into_iter()
            .filter(|c| {
                let name = c.concept.to_lowercase();
                name.contains(&needle) || needle.contains(&name)
            })
            .map(|c| c.id)
            .collect()
    } else {
        vec![ids::concept_id(&ids::canonicalize_concept(concept))]
    };

    let chunks = storage.scan_chunks(None, None).await?;
    let mut matched: Vec<ConceptChunkDto> = chunks
        .into_iter()
        .filter(|c| c.concept_ids.iter().any(|id| matching_ids.contains(id)))
        .map(|c| ConceptChunkDto {
            id: c.id,
            catalog_id: c.catalog_id,
            text: c.text,
            concept_density: c.concept_density,
        })
        .collect();
    matched.sort_by(|a, b| {
        b.concept_density
            .partial_cmp(&a.concept_density)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matched.truncate(limit);
    Ok(matched)
}

/// `concept_search`: finds chunks tagged with a concept, matched fuzzily
/// by name (§4.14, §8 Scenario 1).
pub struct ConceptSearchTool {
    storage: Arc<StorageEngine>,
}

impl ConceptSearchTool {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Tool for ConceptSearchTool {
    fn name(&self) -> &str {
        "concept_search"
    }

    fn description(&self) -> &str {
        "Find chunks tagged with a concept, matched fuzzily by name."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "concept": {"type": "string", "description": "Concept name or fragment"},
                "limit": {"type": "integer", "description": "Maximum results", "default": DEFAULT_LIMIT},
            },
            "required": ["concept"],
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult {
        let concept = match require_str(&arguments, "concept") {
            Ok(c) => c,
            Err(e) => return e,
        };
        let limit = optional_usize(&arguments, "limit", DEFAULT_LIMIT);

        match chunks_tagged_with(&self.storage, concept, limit, true).await {
            Ok(hits) => ToolResult::ok(hits),
            Err(e) => ToolResult::error("search_failed", e.to_string(), None),
        }
    }
}

/// `concept_chunks`: finds chunks tagged with a concept given in its
/// canonical form.
pub struct ConceptChunksTool {
    storage: Arc<StorageEngine>,
}

impl ConceptChunksTool {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Tool for ConceptChunksTool {
    fn name(&self) -> &str {
        "concept_chunks"
    }

    fn description(&self) -> &str {
        "List chunks tagged with a given concept."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "concept": {"type": "string", "description": "Concept name (canonical form)"},
                "limit": {"type": "integer", "description": "Maximum results", "default": DEFAULT_LIMIT},
            },
            "required": ["concept"],
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult {
        let concept = match require_str(&arguments, "concept") {
            Ok(c) => c,
            Err(e) => return e,
        };
        let limit = optional_usize(&arguments, "limit", DEFAULT_LIMIT);

        match chunks_tagged_with(&self.storage, concept, limit, false).await {
            Ok(hits) => ToolResult::ok(hits),
            Err(e) => ToolResult::error("search_failed", e.to_string(), None),
        }
    }
}

/// `source_concepts`: lists concepts and their source documents.
pub struct SourceConceptsTool {
    storage: Arc<StorageEngine>,
}

impl SourceConceptsTool {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Tool for SourceConceptsTool {
    fn name(&self) -> &str {
        "source_concepts"
    }

    fn description(&self) -> &str {
        "List every concept and the source documents it appears in."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "limit": {"type": "integer", "description": "Maximum results", "default": DEFAULT_LIMIT},
            },
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult {
        let limit = optional_usize(&arguments, "limit", DEFAULT_LIMIT);
        let rows = match self.storage.scan_concepts(None, Some(limit)).await {
            Ok(r) => r,
            Err(e) => return ToolResult::error("search_failed", e.to_string(), None),
        };
        ToolResult::ok(
            rows.into_iter()
                .map(|c| ConceptDto {
                    id: c.id,
                    concept: c.concept,
                    category: c.category,
                    weight: c.weight,
                    chunk_count: c.chunk_count,
                    sources: c.sources,
                })
                .collect::<Vec<_>>(),
        )
    }
}

/// `extract_concepts`: returns a document's concept metadata from `catalog`.
pub struct ExtractConceptsTool {
    storage: Arc<StorageEngine>,
}

impl ExtractConceptsTool {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Tool for ExtractConceptsTool {
    fn name(&self) -> &str {
        "extract_concepts"
    }

    fn description(&self) -> &str {
        "Return the previously-extracted concept metadata for a document."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "source": {"type": "string", "description": "Source document path"},
            },
            "required": ["source"],
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult {
        let source = match require_str(&arguments, "source") {
            Ok(s) => s,
            Err(e) => return e,
        };
        let escaped = source.replace('\'', "''");
        let predicate = format!("source = '{escaped}'");
        let rows = match self.storage.scan_catalog(Some(&predicate), Some(1)).await {
            Ok(r) => r,
            Err(e) => return ToolResult::error("search_failed", e.to_string(), None),
        };
        match rows.into_iter().next() {
            Some(row) => ToolResult::ok(row.concepts),
            None => ToolResult::error(
                "not_found",
                format!("no catalog entry for source: {source}"),
                Some("source"),
            ),
        }
    }
}
