//! Error taxonomy for the core (see spec §7).
//!
//! Kinds, not exception hierarchies: each variant is something a caller at
//! the tool boundary needs to branch on (retry vs. surface vs. treat as
//! empty result).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConceptRagError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("ocr error: {0}")]
    Ocr(#[from] OcrError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Raised by the tool layer (C14) when parameters are missing/out-of-range/
/// malformed. Never retried.
#[derive(Debug, Error, Clone)]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("field {field} is out of range: {message}")]
    OutOfRange { field: String, message: String },

    #[error("field {field} has unsupported format: {message}")]
    BadFormat { field: String, message: String },
}

/// Raised by the storage adapter (C2) and field codec (C3).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("row schema error in field '{field}' (row {row_id}): {message}")]
    RowSchema {
        field: String,
        row_id: String,
        message: String,
    },

    #[error("storage I/O error: {0}")]
    Io(String),
}

/// Category for LLM failures (§4.4, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorCategory {
    RateLimit,
    BadRequest,
    Server,
    Timeout,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm transport error ({category:?}): {message}")]
    Transient {
        category: LlmErrorCategory,
        message: String,
    },

    #[error("llm permanent error ({category:?}): {message}")]
    Permanent {
        category: LlmErrorCategory,
        message: String,
    },

    #[error("llm response could not be parsed: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// §4.4 / §7: rate-limit errors are retried, bad-request errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Transient {
                category: LlmErrorCategory::RateLimit
                    | LlmErrorCategory::Server
                    | LlmErrorCategory::Timeout,
                ..
            }
        )
    }
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("ocr tool unavailable: {0}")]
    ToolMissing(String),

    #[error("ocr page {page} timed out after {timeout_secs}s")]
    PageTimeout { page: usize, timeout_secs: u64 },

    #[error("ocr failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("stage cache I/O error: {0}")]
    Io(String),

    #[error("stage cache entry corrupt for hash {hash}: {message}")]
    Corrupt { hash: String, message: String },
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error: {0}")]
    Io(String),

    #[error("checkpoint file corrupt: {0}")]
    Corrupt(String),
}

/// §7 "Concept.NotFound" is explicitly *not* an error for search-shaped
/// callers (returned as an empty result set) but a named concept lookup
/// that resolves nothing is still represented here so explicit lookups can
/// distinguish "no such concept" from a storage failure.
#[derive(Debug, Error)]
#[error("concept not found: {0}")]
pub struct ConceptNotFound(pub String);
