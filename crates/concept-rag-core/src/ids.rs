//! Stable id / content-hash helpers.
//!
//! `catalog.id` and `concepts.id` must be *stable hashes* of a canonical
//! string (source path, lowercased concept name) per spec invariants I5/I3 —
//! recomputable from the string alone, with no round-trip through a
//! sequence or a random UUID. `chunks.id` is likewise a stable hash of
//! `catalog_id + offset` so re-chunking the same document is idempotent
//! (L2).

use sha2::{Digest, Sha256};

/// Stable 63-bit-positive i64 id derived from an arbitrary string.
/// Uses the first 8 bytes of SHA-256 so ids are effectively collision-free
/// while staying deterministic across runs and platforms.
pub fn stable_id(input: &str) -> i64 {
    let digest = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    (u64::from_be_bytes(bytes) >> 1) as i64
}

/// `chunks.id`: stable hash of `catalog_id + offset`.
pub fn chunk_id(catalog_id: i64, start_offset: usize) -> i64 {
    stable_id(&format!("{catalog_id}:{start_offset}"))
}

/// `concepts.id`: stable hash of the lowercased canonical concept name.
pub fn concept_id(concept_name: &str) -> i64 {
    stable_id(&canonicalize_concept(concept_name))
}

/// `categories.id`: stable hash of the category name.
pub fn category_id(name: &str) -> i64 {
    stable_id(&name.to_lowercase())
}

/// `catalog.id`: stable hash of the absolute source path (I5 bijectivity).
pub fn catalog_id(source: &str) -> i64 {
    stable_id(source)
}

/// Canonical form used for concept deduplication/id computation (§4.9):
/// lowercase, trimmed, internal whitespace collapsed. The *original case*
/// is preserved separately in `concepts.concept` for display.
pub fn canonicalize_concept(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Content digest of raw file bytes, used as `catalog.hash` / `chunks.hash`
/// (§3: "same digest as parent document, for bulk delete").
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        let mut out = String::with_capacity(bytes.as_ref().len() * 2);
        for b in bytes.as_ref() {
            out.push_str(&format!("{:02x}", b));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_deterministic() {
        assert_eq!(stable_id("/a/b/c.pdf"), stable_id("/a/b/c.pdf"));
    }

    #[test]
    fn stable_id_is_positive() {
        assert!(stable_id("anything") >= 0);
    }

    #[test]
    fn canonicalize_concept_normalizes_case_and_whitespace() {
        assert_eq!(
            canonicalize_concept("  API   Gateway "),
            canonicalize_concept("api gateway")
        );
    }

    #[test]
    fn concept_id_is_case_insensitive() {
        assert_eq!(concept_id("API Gateway"), concept_id("api gateway"));
    }

    #[test]
    fn catalog_id_is_bijective_on_distinct_sources() {
        assert_ne!(catalog_id("/a.pdf"), catalog_id("/b.pdf"));
    }

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(content_hash(b"hello"), content_hash(b"hello"));
        assert_ne!(content_hash(b"hello"), content_hash(b"world"));
    }
}
