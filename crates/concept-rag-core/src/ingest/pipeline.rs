//! Per-document ingest pipeline (§5 "Ingest" control flow): load → summarize
//! → extract concepts (cached) → chunk → embed → write → enrich chunk
//! concept ids. Concept indexing (C10) itself runs once per ingest pass,
//! after every document's writes are flushed — see `ingest::worker_pool`.

use crate::cache::StageCache;
use crate::concepts::enricher::{enrich_chunk_concepts, TaggableConcept};
use crate::concepts::ConceptExtractor;
use crate::config::ConceptRagConfig;
use crate::embeddings::EmbeddingModel;
use crate::error::ConceptRagError;
use crate::ids;
use crate::llm::LlmClient;
use crate::processing::{DocumentLoader, TextChunker};
use crate::storage::StorageEngine;
use crate::types::{CatalogRow, ChunkLoc, ChunkRow, ConceptMetadata, DocumentLoc};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] ConceptRagError),
    #[error("document produced no extractable text")]
    EmptyDocument,
    #[error("document load failed or timed out")]
    LoadFailed,
}

pub struct IngestContext {
    pub config: ConceptRagConfig,
    pub storage: Arc<StorageEngine>,
    pub embedder: Arc<dyn EmbeddingModel>,
    pub llm: Arc<dyn LlmClient>,
    pub loader: Arc<DocumentLoader>,
    pub chunker: TextChunker,
    pub extractor: ConceptExtractor,
    pub stage_cache: Arc<StageCache>,
}

#[derive(Debug)]
pub struct IngestOutcome {
    pub hash: String,
    pub chunk_count: usize,
}

/// Processes one document end to end (§5). Idempotent on content hash: if
/// the stage cache already holds this hash's concepts/summary, the LLM
/// calls are skipped and only storage writes happen.
pub async fn process_document(
    ctx: &IngestContext,
    path: &Path,
) -> Result<IngestOutcome, PipelineError> {
    let bytes = std::fs::read(path).map_err(|_| PipelineError::LoadFailed)?;
    let hash = ids::content_hash(&bytes);
    let source = path.to_string_lossy().to_string();

    let pages = ctx
        .loader
        .load(path)
        .map_err(ConceptRagError::from)?
        .ok_or(PipelineError::LoadFailed)?;

    let full_text = pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    if full_text.trim().is_empty() {
        return Err(PipelineError::EmptyDocument);
    }

    let (summary, concepts) = if let Some(entry) = ctx.stage_cache.get(&hash).map_err(ConceptRagError::from)? {
        match (entry.content_overview, entry.concepts) {
            (Some(summary), Some(concepts)) => (summary, concepts),
            _ => extract_and_cache(ctx, &hash, &source, &full_text).await?,
        }
    } else {
        extract_and_cache(ctx, &hash, &source, &full_text).await?
    };

    let enriched_text = format!("{}\n\nConcepts: {}", summary, concepts.primary_concepts.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", "));
    let catalog_id = ids::catalog_id(&source);
    let catalog_vector = ctx.embedder.embed_document(&enriched_text)?;

    let page_count = pages.len();
    let catalog_row = CatalogRow {
        id: catalog_id,
        source: source.clone(),
        hash: hash.clone(),
        text: enriched_text,
        concepts: concepts.clone(),
        concept_categories: concepts.categories.clone(),
        loc: DocumentLoc {
            page_count,
            page_ranges: vec![(1, page_count.max(1))],
        },
        vector: catalog_vector,
    };

    let chunk_results = ctx.chunker.chunk(&full_text);
    let taggable: Vec<TaggableConcept> = concepts
        .primary_concepts
        .iter()
        .map(|c| TaggableConcept {
            id: ids::concept_id(&c.name),
            name: c.name.as_str(),
            category: concepts.categories.first().map(String::as_str).unwrap_or("uncategorized"),
        })
        .collect();
    let total_concepts = taggable.len();

    let mut chunk_rows = Vec::with_capacity(chunk_results.len());
    for chunk in &chunk_results {
        let tags = enrich_chunk_concepts(&chunk.text, &taggable, total_concepts);
        let vector = ctx.embedder.embed_document(&chunk.text)?;
        chunk_rows.push(ChunkRow {
            id: ids::chunk_id(catalog_id, chunk.start_offset),
            catalog_id,
            text: chunk.text.clone(),
            hash: hash.clone(),
            loc: ChunkLoc {
                page_number: None,
                start_offset: chunk.start_offset,
                end_offset: chunk.end_offset,
                heading: chunk.heading.clone(),
            },
            concept_ids: tags.concept_ids,
            concept_categories: tags.concept_categories,
            concept_density: tags.concept_density,
            vector,
        });
    }

    let catalog_predicate = format!("id = {catalog_id}");
    ctx.storage
        .delete_where("catalog", &catalog_predicate)
        .await
        .map_err(ConceptRagError::from)?;
    ctx.storage
        .insert_catalog(&[catalog_row])
        .await
        .map_err(ConceptRagError::from)?;

    let chunks_predicate = format!("catalog_id = {catalog_id}");
    ctx.storage
        .delete_where("chunks", &chunks_predicate)
        .await
        .map_err(ConceptRagError::from)?;
    ctx.storage
        .insert_chunks(&chunk_rows)
        .await
        .map_err(ConceptRagError::from)?;

    Ok(IngestOutcome {
        hash,
        chunk_count: chunk_rows.len(),
    })
}

/// Repair path for `RepairAction::ReenrichChunksInPlace` (§4.8): retags
/// existing chunk rows from the catalog row's already-extracted concepts
/// without re-chunking or re-embedding. Leaves chunk text, offsets, and
/// vectors untouched.
pub async fn reenrich_chunk_tags(
    ctx: &IngestContext,
    catalog_row: &CatalogRow,
    chunk_rows: Vec<ChunkRow>,
) -> Result<IngestOutcome, PipelineError> {
    let taggable: Vec<TaggableConcept> = catalog_row
        .concepts
        .primary_concepts
        .iter()
        .map(|c| TaggableConcept {
            id: ids::concept_id(&c.name),
            name: c.name.as_str(),
            category: catalog_row
                .concepts
                .categories
                .first()
                .map(String::as_str)
                .unwrap_or("uncategorized"),
        })
        .collect();
    let total_concepts = taggable.len();

    let mut retagged = Vec::with_capacity(chunk_rows.len());
    for mut chunk in chunk_rows {
        let tags = enrich_chunk_concepts(&chunk.text, &taggable, total_concepts);
        chunk.concept_ids = tags.concept_ids;
        chunk.concept_categories = tags.concept_categories;
        chunk.concept_density = tags.concept_density;
        retagged.push(chunk);
    }

    let predicate = format!("catalog_id = {}", catalog_row.id);
    ctx.storage
        .delete_where("chunks", &predicate)
        .await
        .map_err(ConceptRagError::from)?;
    ctx.storage
        .insert_chunks(&retagged)
        .await
        .map_err(ConceptRagError::from)?;

    Ok(IngestOutcome {
        hash: catalog_row.hash.clone(),
        chunk_count: retagged.len(),
    })
}

async fn extract_and_cache(
    ctx: &IngestContext,
    hash: &str,
    source: &str,
    full_text: &str,
) -> Result<(String, ConceptMetadata), PipelineError> {
    let summary = ctx
        .llm
        .summarize(full_text, 2000)
        .await
        .map_err(ConceptRagError::from)?;
    let concepts = ctx
        .extractor
        .extract(full_text)
        .await
        .map_err(ConceptRagError::from)?;

    ctx.stage_cache
        .set(&crate::cache::StageCacheEntry {
            hash: hash.to_string(),
            source: source.to_string(),
            processed_at: chrono::Utc::now(),
            concepts: Some(concepts.clone()),
            content_overview: Some(summary.clone()),
        })
        .map_err(ConceptRagError::from)?;

    Ok((summary, concepts))
}
