//! Bounded worker pool for ingest (§5 concurrency model): N parallel
//! document processors pulled from a fixed file list, backpressured by a
//! bounded channel so the loader never reads more than one task ahead of
//! available workers. Progress events follow an `IndexingProgress`-style
//! shape, fanned out over a `tokio::sync::Semaphore` rather than a single
//! sequential loop.

use crate::cache::{Checkpoint, Stage};
use crate::completeness::{self, RepairAction};
use crate::concepts::ConceptIndexer;
use crate::ingest::pipeline::{self, IngestContext, PipelineError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

#[derive(Debug, Clone)]
pub struct IngestEvent {
    pub current_file: String,
    pub processed: usize,
    pub total: usize,
    pub action: String,
}

#[derive(Debug, Default)]
pub struct IngestSummary {
    pub total_processed: usize,
    pub total_failed: usize,
    pub failed_files: Vec<String>,
}

/// Runs the full ingest pass over `files`: bounded-concurrency per-document
/// processing, followed by the C10 concept-indexing barrier (§5: "Concept
/// indexer C10 runs only after all per-document writes in a stage are
/// flushed"). `events` is an optional sink for progress (C17 consumes this).
pub async fn run_ingest(
    ctx: Arc<IngestContext>,
    indexer: Arc<ConceptIndexer>,
    checkpoint: Arc<tokio::sync::Mutex<Checkpoint>>,
    files: Vec<PathBuf>,
    workers: usize,
    events: Option<mpsc::UnboundedSender<IngestEvent>>,
) -> IngestSummary {
    let total = files.len();
    let processed_count = Arc::new(AtomicUsize::new(0));
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut handles = Vec::with_capacity(files.len());

    for file in files {
        let ctx = ctx.clone();
        let checkpoint = checkpoint.clone();
        let semaphore = semaphore.clone();
        let processed_count = processed_count.clone();
        let events = events.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");

            let bytes = std::fs::read(&file).unwrap_or_default();
            let hash = crate::ids::content_hash(&bytes);

            let already_marked = {
                let guard = checkpoint.lock().await;
                guard.is_processed(&hash)
            };

            // §4.8: a checkpoint-marked hash is not necessarily a complete
            // document. Classify its actual storage state before trusting
            // the checkpoint's short-circuit, so a resumed run repairs a
            // document whose chunks (or concepts, or summary) were deleted
            // out from under an otherwise-processed catalog row.
            let mut repair: Option<(RepairAction, Option<crate::types::CatalogRow>, Vec<crate::types::ChunkRow>)> = None;
            if already_marked {
                match completeness::load_document_state(&ctx.storage, &hash).await {
                    Ok((record, catalog_row, chunk_rows)) => {
                        let action = completeness::repair_action(&record);
                        if action == RepairAction::None {
                            return Ok(None);
                        }
                        tracing::info!(file = %file.display(), ?action, "resuming incomplete document");
                        repair = Some((action, catalog_row, chunk_rows));
                    }
                    Err(e) => {
                        tracing::warn!(file = %file.display(), error = %e, "completeness lookup failed, reprocessing document");
                    }
                }
            }

            if let Some(tx) = &events {
                let n = processed_count.load(Ordering::Relaxed);
                let _ = tx.send(IngestEvent {
                    current_file: file.to_string_lossy().to_string(),
                    processed: n,
                    total,
                    action: "processing".to_string(),
                });
            }

            let result = match repair {
                Some((RepairAction::ReenrichChunksInPlace, Some(catalog_row), chunk_rows)) => {
                    pipeline::reenrich_chunk_tags(&ctx, &catalog_row, chunk_rows).await
                }
                _ => pipeline::process_document(&ctx, &file).await,
            };
            processed_count.fetch_add(1, Ordering::Relaxed);

            if let Some(tx) = &events {
                let n = processed_count.load(Ordering::Relaxed);
                let _ = tx.send(IngestEvent {
                    current_file: file.to_string_lossy().to_string(),
                    processed: n,
                    total,
                    action: if result.is_ok() { "done".to_string() } else { "failed".to_string() },
                });
            }

            match &result {
                Ok(outcome) => {
                    let mut guard = checkpoint.lock().await;
                    if let Err(e) = guard.mark_processed(&outcome.hash, &file.to_string_lossy()) {
                        tracing::warn!(error = %e, "failed to persist checkpoint");
                    }
                }
                Err(_) => {
                    let mut guard = checkpoint.lock().await;
                    if let Err(e) = guard.mark_failed(&file.to_string_lossy()) {
                        tracing::warn!(error = %e, "failed to persist checkpoint");
                    }
                }
            }

            result.map(Some).map_err(|e| (file, e))
        });
        handles.push(handle);
    }

    let mut summary = IngestSummary::default();
    for handle in handles {
        match handle.await {
            Ok(Ok(Some(_))) => summary.total_processed += 1,
            Ok(Ok(None)) => {}
            Ok(Err((file, err))) => {
                summary.total_failed += 1;
                summary.failed_files.push(file.to_string_lossy().to_string());
                tracing::warn!(file = %file.display(), error = %pipeline_error_message(&err), "document ingest failed");
            }
            Err(join_err) => {
                summary.total_failed += 1;
                tracing::warn!(error = %join_err, "ingest worker task panicked");
            }
        }
    }

    {
        let mut guard = checkpoint.lock().await;
        if let Err(e) = guard.set_stage(Stage::Documents) {
            tracing::warn!(error = %e, "failed to persist checkpoint");
        }
    }

    if let Err(e) = indexer.run().await {
        tracing::warn!(error = %e, "concept indexer pass failed");
    } else {
        let mut guard = checkpoint.lock().await;
        if let Err(e) = guard.set_stage(Stage::Complete) {
            tracing::warn!(error = %e, "failed to persist checkpoint");
        }
    }

    summary
}

fn pipeline_error_message(err: &PipelineError) -> String {
    err.to_string()
}
