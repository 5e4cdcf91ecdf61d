//! Thesaurus lookups (§4.12 query expansion, §4.10 concept enrichment):
//! synonyms, hypernyms (broader terms), hyponyms (narrower terms). No
//! specific WordNet binding is wired in — the trait is the seam, the same
//! provider-factory pattern used in `embeddings/mod.rs`.
//! `InMemoryThesaurus` is the default: either empty (no enrichment, the
//! common case for a personal corpus with no thesaurus file configured)
//! or loaded from a JSON file of `{term: {synonyms, hypernyms, hyponyms}}`.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ThesaurusEntry {
    pub synonyms: Vec<String>,
    pub hypernyms: Vec<String>,
    pub hyponyms: Vec<String>,
}

pub trait ThesaurusLookup: Send + Sync {
    fn lookup(&self, term: &str) -> Option<ThesaurusEntry>;
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    hypernyms: Vec<String>,
    #[serde(default)]
    hyponyms: Vec<String>,
}

pub struct InMemoryThesaurus {
    entries: HashMap<String, ThesaurusEntry>,
}

impl InMemoryThesaurus {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn from_json_file(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: HashMap<String, RawEntry> = serde_json::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let entries = parsed
            .into_iter()
            .map(|(term, raw)| {
                (
                    term.to_lowercase(),
                    ThesaurusEntry {
                        synonyms: raw.synonyms,
                        hypernyms: raw.hypernyms,
                        hyponyms: raw.hyponyms,
                    },
                )
            })
            .collect();
        Ok(Self { entries })
    }
}

impl ThesaurusLookup for InMemoryThesaurus {
    fn lookup(&self, term: &str) -> Option<ThesaurusEntry> {
        self.entries.get(&term.to_lowercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_thesaurus_finds_nothing() {
        let t = InMemoryThesaurus::empty();
        assert!(t.lookup("anything").is_none());
    }

    #[test]
    fn loads_from_json_file_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thesaurus.json");
        std::fs::write(
            &path,
            r#"{"database": {"synonyms": ["datastore"], "hypernyms": ["software"]}}"#,
        )
        .unwrap();
        let t = InMemoryThesaurus::from_json_file(&path).unwrap();
        let entry = t.lookup("Database").unwrap();
        assert_eq!(entry.synonyms, vec!["datastore".to_string()]);
        assert_eq!(entry.hypernyms, vec!["software".to_string()]);
    }
}
