//! Prompt loading (§4.4, §6): external text files with a single `{CONTENT}`
//! placeholder. The core treats prompt text as opaque — it substitutes
//! verbatim and never mutates it otherwise.

use std::path::Path;

const DEFAULT_SUMMARY_PROMPT: &str =
    "Summarize the following document in 2-4 sentences, focusing on its main subject and purpose:\n\n{CONTENT}";

const DEFAULT_CONCEPTS_PROMPT: &str = concat!(
    "Extract the primary concepts, categories, related concepts, and technical terms from ",
    "the following document. Respond as JSON with fields primary_concepts, categories, ",
    "related_concepts, technical_terms, summary.\n\n{CONTENT}"
);

const DEFAULT_CONCEPTS_CHUNKED_PROMPT: &str = concat!(
    "Extract the primary concepts, categories, related concepts, and technical terms from ",
    "the following excerpt of a larger document. Respond as JSON with fields primary_concepts, ",
    "categories, related_concepts, technical_terms, summary.\n\n{CONTENT}"
);

pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn load_or_default(path: Option<&Path>, default: &str) -> std::io::Result<Self> {
        let template = match path {
            Some(p) => std::fs::read_to_string(p)?,
            None => default.to_string(),
        };
        Ok(Self { template })
    }

    pub fn render(&self, content: &str) -> String {
        self.template.replace("{CONTENT}", content)
    }
}

pub fn summary_prompt(path: Option<&Path>) -> std::io::Result<PromptTemplate> {
    PromptTemplate::load_or_default(path, DEFAULT_SUMMARY_PROMPT)
}

pub fn concepts_prompt(path: Option<&Path>) -> std::io::Result<PromptTemplate> {
    PromptTemplate::load_or_default(path, DEFAULT_CONCEPTS_PROMPT)
}

pub fn concepts_chunked_prompt(path: Option<&Path>) -> std::io::Result<PromptTemplate> {
    PromptTemplate::load_or_default(path, DEFAULT_CONCEPTS_CHUNKED_PROMPT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_content_placeholder() {
        let t = summary_prompt(None).unwrap();
        let rendered = t.render("hello world");
        assert!(rendered.contains("hello world"));
        assert!(!rendered.contains("{CONTENT}"));
    }

    #[test]
    fn loads_from_file_when_given() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.txt");
        std::fs::write(&path, "Custom: {CONTENT}").unwrap();
        let t = summary_prompt(Some(&path)).unwrap();
        assert_eq!(t.render("x"), "Custom: x");
    }
}
