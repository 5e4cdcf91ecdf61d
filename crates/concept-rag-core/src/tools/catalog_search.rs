//! `catalog_search`, `chunks_search`, `broad_chunks_search` (§4.14).

use crate::search::HybridSearch;
use crate::storage::StorageEngine;
use crate::tools::{optional_usize, require_str, Tool, ToolResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_K: usize = 10;

#[derive(Serialize)]
struct CatalogHitDto {
    id: i64,
    source: String,
    text: String,
    score: f32,
}

#[derive(Serialize)]
struct ChunkHitDto {
    id: i64,
    catalog_id: i64,
    text: String,
    score: f32,
}

pub struct CatalogSearchTool {
    search: Arc<HybridSearch>,
}

impl CatalogSearchTool {
    pub fn new(search: Arc<HybridSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for CatalogSearchTool {
    fn name(&self) -> &str {
        "catalog_search"
    }

    fn description(&self) -> &str {
        "Hybrid search over the document catalog (summaries + concepts)."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"},
                "limit": {"type": "integer", "description": "Maximum results", "default": DEFAULT_K},
            },
            "required": ["query"],
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult {
        let query = match require_str(&arguments, "query") {
            Ok(q) => q,
            Err(e) => return e,
        };
        let limit = optional_usize(&arguments, "limit", DEFAULT_K);

        match self.search.search_catalog(query, limit, None).await {
            Ok(hits) => ToolResult::ok(
                hits.into_iter()
                    .map(|h| CatalogHitDto {
                        id: h.row.id,
                        source: h.row.source,
                        text: h.row.text,
                        score: h.hybrid_score,
                    })
                    .collect::<Vec<_>>(),
            ),
            Err(e) => ToolResult::error("search_failed", e.to_string(), None),
        }
    }
}

pub struct ChunksSearchTool {
    search: Arc<HybridSearch>,
    storage: Arc<StorageEngine>,
}

impl ChunksSearchTool {
    pub fn new(search: Arc<HybridSearch>, storage: Arc<StorageEngine>) -> Self {
        Self { search, storage }
    }
}

#[async_trait]
impl Tool for ChunksSearchTool {
    fn name(&self) -> &str {
        "chunks_search"
    }

    fn description(&self) -> &str {
        "Hybrid search over the chunks of one specified source document."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"},
                "source": {"type": "string", "description": "Source document path"},
                "limit": {"type": "integer", "description": "Maximum results", "default": DEFAULT_K},
            },
            "required": ["query", "source"],
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult {
        let query = match require_str(&arguments, "query") {
            Ok(q) => q,
            Err(e) => return e,
        };
        let source = match require_str(&arguments, "source") {
            Ok(s) => s,
            Err(e) => return e,
        };
        let limit = optional_usize(&arguments, "limit", DEFAULT_K);

        let escaped = source.replace('\'', "''");
        let predicate = format!("source = '{escaped}'");
        let catalog_rows = match self.storage.scan_catalog(Some(&predicate), Some(1)).await {
            Ok(rows) => rows,
            Err(e) => return ToolResult::error("search_failed", e.to_string(), None),
        };
        let Some(catalog_row) = catalog_rows.into_iter().next() else {
            return ToolResult::error(
                "not_found",
                format!("no catalog entry for source: {source}"),
                Some("source"),
            );
        };

        let filter = format!("catalog_id = {}", catalog_row.id);
        match self
            .search
            .search_chunks(query, limit, Some(&filter))
            .await
        {
            Ok(hits) => ToolResult::ok(
                hits.into_iter()
                    .map(|h| ChunkHitDto {
                        id: h.row.id,
                        catalog_id: h.row.catalog_id,
                        text: h.row.text,
                        score: h.hybrid_score,
                    })
                    .collect::<Vec<_>>(),
            ),
            Err(e) => ToolResult::error("search_failed", e.to_string(), None),
        }
    }
}

pub struct BroadChunksSearchTool {
    search: Arc<HybridSearch>,
}

impl BroadChunksSearchTool {
    pub fn new(search: Arc<HybridSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for BroadChunksSearchTool {
    fn name(&self) -> &str {
        "broad_chunks_search"
    }

    fn description(&self) -> &str {
        "Hybrid search over chunks across the entire corpus."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"},
                "limit": {"type": "integer", "description": "Maximum results", "default": DEFAULT_K},
            },
            "required": ["query"],
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult {
        let query = match require_str(&arguments, "query") {
            Ok(q) => q,
            Err(e) => return e,
        };
        let limit = optional_usize(&arguments, "limit", DEFAULT_K);

        match self.search.search_chunks(query, limit, None).await {
            Ok(hits) => ToolResult::ok(
                hits.into_iter()
                    .map(|h| ChunkHitDto {
                        id: h.row.id,
                        catalog_id: h.row.catalog_id,
                        text: h.row.text,
                        score: h.hybrid_score,
                    })
                    .collect::<Vec<_>>(),
            ),
            Err(e) => ToolResult::error("search_failed", e.to_string(), None),
        }
    }
}
