//! Document loader (C7): recursive directory walk, PDF/EPUB page extraction,
//! OCR fallback for near-empty pages. A trait-free loader returning owned
//! `Page`s, built around `pdf-extract` + `lopdf` together since `lopdf`
//! gives a structural fallback the fast text layer alone cannot.

use crate::error::OcrError;
use crate::types::Page;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "epub", "mobi"];

/// Heuristic: below this many characters per page, native extraction is
/// considered "near-empty" and OCR fallback kicks in.
const MIN_CHARS_PER_PAGE: usize = 20;

/// Collaborator for OCR, modeled as an external-process boundary rather
/// than a concrete vendor binding (spec §1 Non-goals: OCR accuracy is out
/// of scope, only the fallback *wiring* is in scope).
pub trait OcrInvoker: Send + Sync {
    fn ocr_page(&self, path: &Path, page_number: usize) -> Result<String, OcrError>;
}

/// No-op invoker used when no OCR tool is configured: every page fails,
/// which the loader turns into a placeholder page rather than dropping
/// the page entirely.
pub struct NullOcrInvoker;

impl OcrInvoker for NullOcrInvoker {
    fn ocr_page(&self, _path: &Path, _page_number: usize) -> Result<String, OcrError> {
        Err(OcrError::ToolMissing(
            "no OCR invoker configured".to_string(),
        ))
    }
}

pub struct DocumentLoader {
    ocr: Box<dyn OcrInvoker>,
    doc_timeout: Duration,
    page_timeout: Duration,
}

impl DocumentLoader {
    pub fn new(ocr: Box<dyn OcrInvoker>, doc_timeout_secs: u64, page_timeout_secs: u64) -> Self {
        Self {
            ocr,
            doc_timeout: Duration::from_secs(doc_timeout_secs),
            page_timeout: Duration::from_secs(page_timeout_secs),
        }
    }

    /// Recursive walk from `root`, filtered to supported extensions.
    pub fn discover(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    /// Load a single document into pages. Returns `Ok(None)` if the
    /// per-document timeout elapses before every page is produced,
    /// treated as "marked failed and skipped", not an error that
    /// should abort the whole ingest run.
    pub fn load(&self, path: &Path) -> Result<Option<Vec<Page>>, OcrError> {
        let started = Instant::now();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let raw_pages = match ext.as_str() {
            "pdf" => self.load_pdf(path)?,
            "epub" | "mobi" => self.load_epub(path)?,
            _ => Vec::new(),
        };

        let mut pages = Vec::with_capacity(raw_pages.len());
        for (page_number, text) in raw_pages.into_iter().enumerate() {
            if started.elapsed() > self.doc_timeout {
                return Ok(None);
            }

            let final_text = if text.trim().chars().count() < MIN_CHARS_PER_PAGE {
                self.ocr_with_timeout(path, page_number)
                    .unwrap_or_default()
            } else {
                text
            };

            pages.push(Page {
                text: final_text,
                page_number,
                metadata: HashMap::new(),
            });
        }

        Ok(Some(pages))
    }

    fn ocr_with_timeout(&self, path: &Path, page_number: usize) -> Result<String, OcrError> {
        let started = Instant::now();
        let result = self.ocr.ocr_page(path, page_number);
        if started.elapsed() > self.page_timeout {
            return Err(OcrError::PageTimeout {
                page: page_number,
                timeout_secs: self.page_timeout.as_secs(),
            });
        }
        result
    }

    /// Fast path: `pdf-extract`'s whole-document text layer, split on form
    /// feeds. Falls back to `lopdf`'s structural page walk when the fast
    /// path yields garbled/near-empty output (column-garble heuristic).
    fn load_pdf(&self, path: &Path) -> Result<Vec<String>, OcrError> {
        match pdf_extract::extract_text(path) {
            Ok(text) if looks_reasonable(&text) => {
                Ok(text.split('\u{c}').map(|s| s.to_string()).collect())
            }
            _ => self.load_pdf_structural(path),
        }
    }

    fn load_pdf_structural(&self, path: &Path) -> Result<Vec<String>, OcrError> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| OcrError::Failed(format!("lopdf failed to open {:?}: {e}", path)))?;
        let mut pages = Vec::new();
        for (page_number, page_id) in doc.get_pages() {
            let text = doc
                .extract_text(&[page_number])
                .unwrap_or_default();
            pages.push(text);
            let _ = page_id;
        }
        Ok(pages)
    }

    fn load_epub(&self, path: &Path) -> Result<Vec<String>, OcrError> {
        let file = std::fs::File::open(path)
            .map_err(|e| OcrError::Failed(format!("cannot open {:?}: {e}", path)))?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| OcrError::Failed(format!("not a valid epub/zip: {e}")))?;

        let mut pages = Vec::new();
        for i in 0..archive.len() {
            let mut entry = match archive.by_index(i) {
                Ok(e) => e,
                Err(_) => continue,
            };
            let name = entry.name().to_string();
            if !(name.ends_with(".xhtml") || name.ends_with(".html") || name.ends_with(".htm")) {
                continue;
            }
            let mut raw = String::new();
            use std::io::Read;
            if entry.read_to_string(&mut raw).is_err() {
                continue;
            }
            pages.push(strip_html_tags(&raw));
        }
        Ok(pages)
    }
}

/// True unless the text looks like a column-garbled PDF extraction (very
/// short relative to file complexity, or mostly whitespace).
fn looks_reasonable(text: &str) -> bool {
    let non_whitespace = text.chars().filter(|c| !c.is_whitespace()).count();
    non_whitespace > MIN_CHARS_PER_PAGE
}

fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_simple_html() {
        assert_eq!(strip_html_tags("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn looks_reasonable_rejects_near_empty_text() {
        assert!(!looks_reasonable("   \n\n  "));
        assert!(looks_reasonable(
            "This page contains a reasonable amount of extracted text."
        ));
    }

    #[test]
    fn discover_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"x").unwrap();
        let loader = DocumentLoader::new(Box::new(NullOcrInvoker), 600, 60);
        let found = loader.discover(dir.path());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file_name().unwrap(), "a.pdf");
    }

    #[test]
    fn null_invoker_always_errors() {
        let invoker = NullOcrInvoker;
        assert!(invoker.ocr_page(Path::new("/tmp/x.pdf"), 0).is_err());
    }
}
