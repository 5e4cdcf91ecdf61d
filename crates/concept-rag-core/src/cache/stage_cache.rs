//! Stage cache (C5): one JSON file per document hash under
//! `<dbpath>/.stage-cache/`, so an expensive LLM summary/concept
//! extraction survives a later failure (DB write, OCR on a different
//! file) without re-billing the LLM. Writes are atomic: write to a temp
//! file in the same directory, then rename — the rename is what makes a
//! reader never observe a half-written entry.

use crate::error::CacheError;
use crate::types::ConceptMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageCacheEntry {
    pub hash: String,
    pub source: String,
    pub processed_at: DateTime<Utc>,
    pub concepts: Option<ConceptMetadata>,
    pub content_overview: Option<String>,
}

pub struct StageCache {
    dir: PathBuf,
    ttl: chrono::Duration,
}

impl StageCache {
    pub fn new(db_path: &Path, ttl_days: u64) -> Result<Self, CacheError> {
        let dir = db_path.join(".stage-cache");
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::Io(e.to_string()))?;
        Ok(Self {
            dir,
            ttl: chrono::Duration::days(ttl_days as i64),
        })
    }

    fn path_for(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}.json"))
    }

    pub fn has(&self, hash: &str) -> bool {
        self.path_for(hash).exists()
    }

    pub fn get(&self, hash: &str) -> Result<Option<StageCacheEntry>, CacheError> {
        let path = self.path_for(hash);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| CacheError::Io(e.to_string()))?;
        let entry: StageCacheEntry = serde_json::from_str(&raw).map_err(|e| CacheError::Corrupt {
            hash: hash.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(entry))
    }

    pub fn set(&self, entry: &StageCacheEntry) -> Result<(), CacheError> {
        let path = self.path_for(&entry.hash);
        let tmp = path.with_extension("json.tmp");
        let raw = serde_json::to_string_pretty(entry).map_err(|e| CacheError::Io(e.to_string()))?;
        std::fs::write(&tmp, raw).map_err(|e| CacheError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::Io(e.to_string()))?;
        Ok(())
    }

    pub fn delete(&self, hash: &str) -> Result<(), CacheError> {
        let path = self.path_for(hash);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| CacheError::Io(e.to_string()))?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        for hash in self.list_hashes()? {
            self.delete(&hash)?;
        }
        Ok(())
    }

    pub fn list_hashes(&self) -> Result<Vec<String>, CacheError> {
        let mut hashes = Vec::new();
        let entries = std::fs::read_dir(&self.dir).map_err(|e| CacheError::Io(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io(e.to_string()))?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(hash) = name.strip_suffix(".json") {
                    hashes.push(hash.to_string());
                }
            }
        }
        Ok(hashes)
    }

    /// Remove entries older than the configured TTL (default 7 days).
    pub fn clean_expired(&self) -> Result<usize, CacheError> {
        let now = Utc::now();
        let mut removed = 0;
        for hash in self.list_hashes()? {
            if let Some(entry) = self.get(&hash)? {
                if now.signed_duration_since(entry.processed_at) > self.ttl {
                    self.delete(&hash)?;
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hash: &str, processed_at: DateTime<Utc>) -> StageCacheEntry {
        StageCacheEntry {
            hash: hash.to_string(),
            source: "/docs/a.pdf".to_string(),
            processed_at,
            concepts: None,
            content_overview: Some("overview".to_string()),
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StageCache::new(dir.path(), 7).unwrap();
        cache.set(&entry("abc", Utc::now())).unwrap();
        assert!(cache.has("abc"));
        let got = cache.get("abc").unwrap().unwrap();
        assert_eq!(got.source, "/docs/a.pdf");
    }

    #[test]
    fn missing_hash_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StageCache::new(dir.path(), 7).unwrap();
        assert!(cache.get("nope").unwrap().is_none());
    }

    #[test]
    fn clean_expired_removes_old_entries_only() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StageCache::new(dir.path(), 7).unwrap();
        cache.set(&entry("fresh", Utc::now())).unwrap();
        cache
            .set(&entry("stale", Utc::now() - chrono::Duration::days(10)))
            .unwrap();

        let removed = cache.clean_expired().unwrap();
        assert_eq!(removed, 1);
        assert!(cache.has("fresh"));
        assert!(!cache.has("stale"));
    }

    #[test]
    fn clear_removes_all_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StageCache::new(dir.path(), 7).unwrap();
        cache.set(&entry("a", Utc::now())).unwrap();
        cache.set(&entry("b", Utc::now())).unwrap();
        cache.clear().unwrap();
        assert!(cache.list_hashes().unwrap().is_empty());
    }
}
