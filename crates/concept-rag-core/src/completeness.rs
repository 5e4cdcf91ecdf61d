//! Completeness checker (C8, §4.8): given a document hash, classifies the
//! existing database state and directs repair rather than blindly
//! re-ingesting. The decision table is an invariant of the repair
//! protocol — in particular, "chunk_concepts only" must never trigger a
//! chunk rebuild, or correct chunk text would be thrown away just to
//! re-tag it.

use crate::error::StorageError;
use crate::storage::StorageEngine;
use crate::types::{CatalogRow, ChunkRow, CompletenessRecord, MissingComponent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairAction {
    FullIngest,
    ResummarizeAndExtract,
    RechunkDocument,
    ReenrichChunksInPlace,
    RederiveCategoriesOnly,
    None,
}

pub fn classify(
    has_record: bool,
    has_summary: bool,
    has_concepts: bool,
    has_chunks: bool,
    chunks_lack_concept_tags: bool,
) -> CompletenessRecord {
    let mut missing = Vec::new();
    if !has_record {
        missing.push(MissingComponent::Catalog);
    }
    if has_record && !has_summary {
        missing.push(MissingComponent::Summary);
    }
    if has_record && !has_concepts {
        missing.push(MissingComponent::Concepts);
    }
    if has_record && !has_chunks {
        missing.push(MissingComponent::Chunks);
    }
    if has_record && has_chunks && chunks_lack_concept_tags {
        missing.push(MissingComponent::ChunkConcepts);
    }

    CompletenessRecord {
        has_record,
        has_summary,
        has_concepts,
        has_chunks,
        chunks_lack_concept_tags,
        is_complete: missing.is_empty(),
        missing_components: missing,
    }
}

/// §4.8 decision table. Checked in priority order: a missing catalog row
/// dominates (full ingest supersedes every narrower repair).
pub fn repair_action(record: &CompletenessRecord) -> RepairAction {
    if record.missing_components.contains(&MissingComponent::Catalog) {
        return RepairAction::FullIngest;
    }
    if record.missing_components.contains(&MissingComponent::Summary)
        || record.missing_components.contains(&MissingComponent::Concepts)
    {
        return RepairAction::ResummarizeAndExtract;
    }
    if record.missing_components.contains(&MissingComponent::Chunks) {
        return RepairAction::RechunkDocument;
    }
    if record
        .missing_components
        .contains(&MissingComponent::ChunkConcepts)
    {
        return RepairAction::ReenrichChunksInPlace;
    }
    if record
        .missing_components
        .contains(&MissingComponent::Categories)
    {
        return RepairAction::RederiveCategoriesOnly;
    }
    RepairAction::None
}

/// Looks up a document's current storage state by content hash and
/// classifies it (§4.8). Used to decide, for an already-checkpointed hash,
/// whether a resumed ingest run actually has nothing left to do or whether
/// some component (most often `chunks`, deleted out from under the
/// catalog row) needs repair. Returns the catalog row and its chunk rows
/// alongside the classification so a caller driving `repair_action` can
/// act on them without a second scan.
pub async fn load_document_state(
    storage: &StorageEngine,
    hash: &str,
) -> Result<(CompletenessRecord, Option<CatalogRow>, Vec<ChunkRow>), StorageError> {
    let escaped = hash.replace('\'', "''");
    let predicate = format!("hash = '{escaped}'");
    let catalog_row = storage
        .scan_catalog(Some(&predicate), Some(1))
        .await?
        .into_iter()
        .next();

    let has_record = catalog_row.is_some();
    let has_summary = catalog_row
        .as_ref()
        .map(|r| !r.text.trim().is_empty())
        .unwrap_or(false);
    let has_concepts = catalog_row
        .as_ref()
        .map(|r| !r.concepts.primary_concepts.is_empty())
        .unwrap_or(false);

    let chunk_rows = if let Some(row) = &catalog_row {
        let chunk_predicate = format!("catalog_id = {}", row.id);
        storage.scan_chunks(Some(&chunk_predicate), None).await?
    } else {
        Vec::new()
    };
    let has_chunks = !chunk_rows.is_empty();
    let chunks_lack_concept_tags =
        has_chunks && chunk_rows.iter().all(|c| c.concept_ids.is_empty());

    let record = classify(
        has_record,
        has_summary,
        has_concepts,
        has_chunks,
        chunks_lack_concept_tags,
    );
    Ok((record, catalog_row, chunk_rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_document_needs_no_repair() {
        let record = classify(true, true, true, true, false);
        assert!(record.is_complete);
        assert_eq!(repair_action(&record), RepairAction::None);
    }

    #[test]
    fn missing_catalog_triggers_full_ingest() {
        let record = classify(false, false, false, false, false);
        assert_eq!(repair_action(&record), RepairAction::FullIngest);
    }

    #[test]
    fn missing_summary_triggers_resummarize() {
        let record = classify(true, false, true, true, false);
        assert_eq!(repair_action(&record), RepairAction::ResummarizeAndExtract);
    }

    #[test]
    fn missing_chunks_triggers_rechunk_without_touching_catalog() {
        let record = classify(true, true, true, false, false);
        assert_eq!(repair_action(&record), RepairAction::RechunkDocument);
    }

    #[test]
    fn chunk_concepts_only_never_rechunks() {
        let record = classify(true, true, true, true, true);
        assert_eq!(record.missing_components, vec![MissingComponent::ChunkConcepts]);
        assert_eq!(repair_action(&record), RepairAction::ReenrichChunksInPlace);
    }
}
