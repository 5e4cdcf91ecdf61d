//! Checkpoint store (C6): a single JSON file tracking overall ingest
//! progress, atomically replaced on every write so a crash mid-ingest
//! never leaves a torn checkpoint. The `stage` field encodes the
//! ordering barrier from §5: concept indexing (C10) only runs after all
//! per-document writes in the current stage are flushed.

use crate::error::CheckpointError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Documents,
    Concepts,
    Summaries,
    Complete,
}

const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub processed_hashes: HashSet<String>,
    pub stage: Stage,
    pub last_file: Option<String>,
    pub last_updated_at: DateTime<Utc>,
    pub total_processed: u64,
    pub total_failed: u64,
    pub failed_files: Vec<String>,
    pub version: u32,
    pub database_path: String,
    pub files_dir: String,

    #[serde(skip)]
    path: PathBuf,
}

impl Checkpoint {
    fn file_path(db_path: &Path) -> PathBuf {
        db_path.join(".seeding-checkpoint.json")
    }

    /// Load the checkpoint for this run. If `database_path`/`files_dir`
    /// differ from the prior run, the caller is warned but the existing
    /// processed set is kept (§4.6 resume semantics).
    pub fn load(db_path: &Path, files_dir: &str) -> Result<Self, CheckpointError> {
        let path = Self::file_path(db_path);
        if !path.exists() {
            return Ok(Self::new(db_path, files_dir));
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| CheckpointError::Io(e.to_string()))?;
        let mut checkpoint: Checkpoint =
            serde_json::from_str(&raw).map_err(|e| CheckpointError::Corrupt(e.to_string()))?;
        checkpoint.path = path;

        if checkpoint.database_path != db_path.to_string_lossy() || checkpoint.files_dir != files_dir {
            tracing::warn!(
                prior_db = %checkpoint.database_path,
                prior_files_dir = %checkpoint.files_dir,
                "checkpoint was recorded against a different database/files_dir; continuing with existing processed set"
            );
        }

        Ok(checkpoint)
    }

    pub fn new(db_path: &Path, files_dir: &str) -> Self {
        Self {
            processed_hashes: HashSet::new(),
            stage: Stage::Documents,
            last_file: None,
            last_updated_at: Utc::now(),
            total_processed: 0,
            total_failed: 0,
            failed_files: Vec::new(),
            version: CHECKPOINT_VERSION,
            database_path: db_path.to_string_lossy().to_string(),
            files_dir: files_dir.to_string(),
            path: Self::file_path(db_path),
        }
    }

    pub fn is_processed(&self, hash: &str) -> bool {
        self.processed_hashes.contains(hash)
    }

    pub fn mark_processed(&mut self, hash: &str, path: &str) -> Result<(), CheckpointError> {
        self.processed_hashes.insert(hash.to_string());
        self.last_file = Some(path.to_string());
        self.total_processed += 1;
        self.last_updated_at = Utc::now();
        self.persist()
    }

    pub fn mark_failed(&mut self, path: &str) -> Result<(), CheckpointError> {
        self.failed_files.push(path.to_string());
        self.total_failed += 1;
        self.last_updated_at = Utc::now();
        self.persist()
    }

    pub fn set_stage(&mut self, stage: Stage) -> Result<(), CheckpointError> {
        self.stage = stage;
        self.last_updated_at = Utc::now();
        self.persist()
    }

    pub fn clear(&mut self) -> Result<(), CheckpointError> {
        self.processed_hashes.clear();
        self.stage = Stage::Documents;
        self.last_file = None;
        self.total_processed = 0;
        self.total_failed = 0;
        self.failed_files.clear();
        self.last_updated_at = Utc::now();
        self.persist()
    }

    fn persist(&self) -> Result<(), CheckpointError> {
        let tmp = self.path.with_extension("json.tmp");
        let raw = serde_json::to_string_pretty(self).map_err(|e| CheckpointError::Io(e.to_string()))?;
        std::fs::write(&tmp, raw).map_err(|e| CheckpointError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| CheckpointError::Io(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_checkpoint_starts_at_documents_stage() {
        let dir = tempfile::tempdir().unwrap();
        let cp = Checkpoint::new(dir.path(), "/docs");
        assert_eq!(cp.stage, Stage::Documents);
        assert!(!cp.is_processed("abc"));
    }

    #[test]
    fn mark_processed_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut cp = Checkpoint::new(dir.path(), "/docs");
        cp.mark_processed("abc", "/docs/a.pdf").unwrap();

        let reloaded = Checkpoint::load(dir.path(), "/docs").unwrap();
        assert!(reloaded.is_processed("abc"));
        assert_eq!(reloaded.total_processed, 1);
    }

    #[test]
    fn clear_resets_processed_set_and_stage() {
        let dir = tempfile::tempdir().unwrap();
        let mut cp = Checkpoint::new(dir.path(), "/docs");
        cp.mark_processed("abc", "/docs/a.pdf").unwrap();
        cp.set_stage(Stage::Complete).unwrap();
        cp.clear().unwrap();
        assert!(!cp.is_processed("abc"));
        assert_eq!(cp.stage, Stage::Documents);
    }

    #[test]
    fn load_on_fresh_directory_yields_new_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let cp = Checkpoint::load(dir.path(), "/docs").unwrap();
        assert_eq!(cp.total_processed, 0);
    }
}
