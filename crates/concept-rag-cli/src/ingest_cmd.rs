//! `concept-rag ingest` (§6 "Ingest CLI"): resolves config, applies
//! `--overwrite`/`--resume`/`--clean-checkpoint` semantics, walks
//! `--filesdir`, and runs the bounded worker pool to completion.

use crate::cli::IngestArgs;
use crate::progress;
use anyhow::{Context, Result};
use concept_rag_core::{run_ingest, Application, ConceptRagConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Exit code contract from §6: 0 success, 1 fatal init error, 2 invalid args.
pub async fn run(args: IngestArgs) -> Result<i32> {
    if !args.filesdir.is_dir() {
        eprintln!("--filesdir {} is not a directory", args.filesdir.display());
        return Ok(2);
    }

    let mut config = ConceptRagConfig::default();
    if let Some(dbpath) = &args.dbpath {
        config.db_path = dbpath.clone();
    }
    config.apply_env_overlay();
    if let Some(workers) = args.workers {
        config.ingest.workers = workers;
    }
    if let Some(max_docs) = args.max_docs {
        config.ingest.max_docs = Some(max_docs);
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    let app = Application::bootstrap(config.clone())
        .await
        .context("failed to initialize application")?;

    if args.overwrite {
        app.purge_tables()
            .await
            .context("failed to drop existing tables")?;
    }

    let mut checkpoint = app
        .load_checkpoint(&args.filesdir)
        .context("failed to load checkpoint")?;
    if args.overwrite || args.clean_checkpoint {
        checkpoint
            .clear()
            .context("failed to clear checkpoint")?;
    }

    let ingest_ctx = app.ingest_context()?;
    if args.overwrite {
        ingest_ctx
            .stage_cache
            .clear()
            .context("failed to clear stage cache")?;
    }

    let files = discover_files(&args.filesdir, config.ingest.max_docs);
    tracing::info!(count = files.len(), dir = %args.filesdir.display(), "discovered documents");

    let ingest_ctx = Arc::new(ingest_ctx);
    let checkpoint = Arc::new(Mutex::new(checkpoint));
    let (tx, rx) = mpsc::unbounded_channel();
    let progress_handle = tokio::spawn(progress::drive(rx));

    let summary = run_ingest(
        ingest_ctx,
        app.concept_indexer.clone(),
        checkpoint,
        files,
        config.ingest.workers,
        Some(tx),
    )
    .await;

    let _ = progress_handle.await;

    println!(
        "ingest complete: {} processed, {} failed",
        summary.total_processed, summary.total_failed
    );
    for f in &summary.failed_files {
        println!("  failed: {f}");
    }

    Ok(0)
}

fn discover_files(root: &std::path::Path, max_docs: Option<usize>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            matches!(
                e.path().extension().and_then(|ext| ext.to_str()),
                Some("pdf") | Some("epub") | Some("mobi")
            )
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    if let Some(max) = max_docs {
        files.truncate(max);
    }
    files
}
