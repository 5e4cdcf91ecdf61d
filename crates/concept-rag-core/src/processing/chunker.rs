//! Sliding-window text chunker (C7 §4.9 chunk policy: ~500 chars, ~50-char
//! overlap, prefer sentence/paragraph boundaries over a hard cut). The
//! contextual-retrieval and form-field-aware variants are dropped since
//! `DocumentSection` here only distinguishes `Text` and `Table`.

use crate::types::DocumentSection;

#[derive(Debug, Clone)]
pub struct ChunkResult {
    pub text: String,
    pub index: usize,
    pub heading: Option<String>,
    pub start_offset: usize,
    pub end_offset: usize,
}

pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    min_chunk_size: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize, min_chunk_size: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            min_chunk_size,
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<ChunkResult> {
        if text.len() <= self.chunk_size {
            if text.len() < self.min_chunk_size {
                return Vec::new();
            }
            return vec![ChunkResult {
                text: text.to_string(),
                index: 0,
                heading: None,
                start_offset: 0,
                end_offset: text.len(),
            }];
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 0;

        while start < text.len() {
            let raw_end = (start + self.chunk_size).min(text.len());
            let end = snap_to_char_boundary(text, raw_end);

            let actual_end = if end < text.len() {
                self.find_break_point(text, start, end)
            } else {
                end
            };

            let chunk_text = &text[start..actual_end];

            if chunk_text.len() >= self.min_chunk_size {
                let heading = self.extract_heading(chunk_text);

                chunks.push(ChunkResult {
                    text: chunk_text.to_string(),
                    index,
                    heading,
                    start_offset: start,
                    end_offset: actual_end,
                });
                index += 1;
            }

            let step = if actual_end - start > self.chunk_overlap {
                actual_end - start - self.chunk_overlap
            } else {
                actual_end - start
            };

            let raw_next = start + step;
            start = snap_to_char_boundary(text, raw_next);
            if start >= text.len() {
                break;
            }
        }

        chunks
    }

    fn find_break_point(&self, text: &str, start: usize, preferred_end: usize) -> usize {
        let raw_search_start = if preferred_end > 200 {
            preferred_end - 200
        } else {
            start
        };
        let search_start = snap_to_char_boundary(text, raw_search_start);
        let safe_end = snap_to_char_boundary(text, preferred_end);

        if search_start >= safe_end {
            return safe_end;
        }

        let search_region = &text[search_start..safe_end];

        // Priority: paragraph break > sentence end > line break > word break
        if let Some(pos) = search_region.rfind("\n\n") {
            return search_start + pos + 2;
        }
        if let Some(pos) = search_region.rfind(". ") {
            return search_start + pos + 2;
        }
        if let Some(pos) = search_region.rfind(".\n") {
            return search_start + pos + 2;
        }
        if let Some(pos) = search_region.rfind('\n') {
            return search_start + pos + 1;
        }
        if let Some(pos) = search_region.rfind(' ') {
            return search_start + pos + 1;
        }

        safe_end
    }

    fn extract_heading(&self, text: &str) -> Option<String> {
        let first_line = text.lines().next()?;
        if first_line.starts_with('#') {
            Some(first_line.trim_start_matches('#').trim().to_string())
        } else {
            None
        }
    }

    /// Structure-aware chunking: tables stay atomic (split by row groups only
    /// when they exceed twice the chunk size), narrative text goes through
    /// the sliding window.
    pub fn chunk_structured(&self, sections: &[DocumentSection]) -> Vec<ChunkResult> {
        let mut results = Vec::new();
        let mut global_index = 0usize;

        for section in sections {
            match section {
                DocumentSection::Text {
                    content,
                    page: _,
                    heading,
                } => {
                    let content = content.trim();
                    if content.len() < self.min_chunk_size {
                        continue;
                    }
                    for mut c in self.chunk(content) {
                        c.index = global_index;
                        if c.heading.is_none() {
                            c.heading = heading.clone();
                        }
                        results.push(c);
                        global_index += 1;
                    }
                }
                DocumentSection::Table {
                    headers,
                    rows,
                    page,
                    caption,
                } => {
                    if rows.is_empty() {
                        continue;
                    }
                    let header_line = format!("| {} |", headers.join(" | "));
                    let separator = format!(
                        "| {} |",
                        headers.iter().map(|_| "---").collect::<Vec<_>>().join(" | ")
                    );
                    let mut table_body = format!("{}\n{}\n", header_line, separator);
                    for row in rows {
                        table_body.push_str(&format!("| {} |\n", row.join(" | ")));
                    }
                    let table_body = table_body.trim().to_string();
                    let heading = Some(format!(
                        "{} (page {})",
                        caption.as_deref().unwrap_or("Table"),
                        page
                    ));

                    if table_body.len() <= self.chunk_size * 2 {
                        results.push(ChunkResult {
                            end_offset: table_body.len(),
                            text: table_body,
                            index: global_index,
                            heading,
                            start_offset: 0,
                        });
                        global_index += 1;
                    } else {
                        for mut c in self.chunk(&table_body) {
                            c.index = global_index;
                            c.heading = heading.clone();
                            results.push(c);
                            global_index += 1;
                        }
                    }
                }
            }
        }

        results
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(500, 50, 100)
    }
}

fn snap_to_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut p = pos;
    while p > 0 && !text.is_char_boundary(p) {
        p -= 1;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_below_min_size_is_dropped() {
        let chunker = TextChunker::new(500, 50, 100);
        assert!(chunker.chunk("too short").is_empty());
    }

    #[test]
    fn short_text_above_min_size_is_one_chunk() {
        let chunker = TextChunker::new(500, 50, 10);
        let chunks = chunker.chunk("this is long enough to keep as a single chunk");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn long_text_is_split_with_overlap() {
        let chunker = TextChunker::new(500, 50, 100);
        let text = "word ".repeat(400);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        for w in chunks.windows(2) {
            assert!(w[1].start_offset < w[0].end_offset, "chunks should overlap");
        }
    }

    #[test]
    fn chunks_never_split_mid_utf8_char() {
        let chunker = TextChunker::new(20, 5, 5);
        let text = "caf\u{e9} ".repeat(20);
        for c in chunker.chunk(&text) {
            assert!(text.is_char_boundary(c.start_offset));
            assert!(text.is_char_boundary(c.end_offset));
        }
    }
}
