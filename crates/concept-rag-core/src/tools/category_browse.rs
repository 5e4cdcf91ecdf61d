//! `category_search`, `list_categories`, `list_concepts_in_category` (§4.14).

use crate::search::HybridSearch;
use crate::storage::StorageEngine;
use crate::tools::{optional_usize, require_str, Tool, ToolResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 20;

#[derive(Serialize)]
struct CategoryDto {
    id: i64,
    name: String,
    alias: String,
    document_count: u32,
    concept_count: u32,
}

/// `category_search`: hybrid-searches chunks within one semantic category.
pub struct CategorySearchTool {
    search: Arc<HybridSearch>,
}

impl CategorySearchTool {
    pub fn new(search: Arc<HybridSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for CategorySearchTool {
    fn name(&self) -> &str {
        "category_search"
    }

    fn description(&self) -> &str {
        "Find chunks within a given semantic category."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"},
                "category": {"type": "string", "description": "Category name"},
                "limit": {"type": "integer", "description": "Maximum results", "default": DEFAULT_LIMIT},
            },
            "required": ["query", "category"],
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult {
        let query = match require_str(&arguments, "query") {
            Ok(q) => q,
            Err(e) => return e,
        };
        let category = match require_str(&arguments, "category") {
            Ok(c) => c,
            Err(e) => return e,
        };
        let limit = optional_usize(&arguments, "limit", DEFAULT_LIMIT);

        // concept_categories is a JSON text column; push-down isn't
        // possible, so filter the already-candidate set client-side.
        let hits = match self.search.search_chunks(query, limit * 4, None).await {
            Ok(h) => h,
            Err(e) => return ToolResult::error("search_failed", e.to_string(), None),
        };
        let lower_category = category.to_lowercase();
        let filtered: Vec<_> = hits
            .into_iter()
            .filter(|h| {
                h.row
                    .concept_categories
                    .iter()
                    .any(|c| c.to_lowercase() == lower_category)
            })
            .take(limit)
            .map(|h| {
                serde_json::json!({
                    "id": h.row.id,
                    "catalog_id": h.row.catalog_id,
                    "text": h.row.text,
                    "score": h.hybrid_score,
                })
            })
            .collect();

        ToolResult::ok(filtered)
    }
}

/// `list_categories`: browse the derived `categories` table.
pub struct ListCategoriesTool {
    storage: Arc<StorageEngine>,
}

impl ListCategoriesTool {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Tool for ListCategoriesTool {
    fn name(&self) -> &str {
        "list_categories"
    }

    fn description(&self) -> &str {
        "List every known category with document/concept counts."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _arguments: Value) -> ToolResult {
        match self.storage.scan_categories(None, None).await {
            Ok(rows) => ToolResult::ok(
                rows.into_iter()
                    .map(|c| CategoryDto {
                        id: c.id,
                        name: c.name,
                        alias: c.alias,
                        document_count: c.document_count,
                        concept_count: c.concept_count,
                    })
                    .collect::<Vec<_>>(),
            ),
            Err(e) => ToolResult::error("search_failed", e.to_string(), None),
        }
    }
}

/// `list_concepts_in_category`: browse the concept vocabulary of one category.
pub struct ListConceptsInCategoryTool {
    storage: Arc<StorageEngine>,
}

impl ListConceptsInCategoryTool {
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Tool for ListConceptsInCategoryTool {
    fn name(&self) -> &str {
        "list_concepts_in_category"
    }

    fn description(&self) -> &str {
        "List concepts belonging to a given category."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "category": {"type": "string", "description": "Category name"},
                "limit": {"type": "integer", "description": "Maximum results", "default": DEFAULT_LIMIT},
            },
            "required": ["category"],
        })
    }

    async fn call(&self, arguments: Value) -> ToolResult {
        let category = match require_str(&arguments, "category") {
            Ok(c) => c,
            Err(e) => return e,
        };
        let limit = optional_usize(&arguments, "limit", DEFAULT_LIMIT);

        let escaped = category.replace('\'', "''");
        let predicate = format!("category = '{escaped}'");
        match self
            .storage
            .scan_concepts(Some(&predicate), Some(limit))
            .await
        {
            Ok(rows) => ToolResult::ok(
                rows.into_iter()
                    .map(|c| serde_json::json!({
                        "id": c.id,
                        "concept": c.concept,
                        "weight": c.weight,
                        "chunk_count": c.chunk_count,
                    }))
                    .collect::<Vec<_>>(),
            ),
            Err(e) => ToolResult::error("search_failed", e.to_string(), None),
        }
    }
}
