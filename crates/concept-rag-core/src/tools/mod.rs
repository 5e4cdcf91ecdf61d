//! Tool layer (C14, §4.14): one small adapter per agent-facing operation.
//! Each tool validates parameters, invokes a domain service, and formats the
//! result as `{content: [{type: "text", text: JSON}], isError: bool}`,
//! following a `ToolDefinition`/handler split in the style of a Model
//! Context Protocol server.

pub mod catalog_search;
pub mod category_browse;
pub mod concept_browse;
pub mod guidance;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

pub use catalog_search::{BroadChunksSearchTool, CatalogSearchTool, ChunksSearchTool};
pub use category_browse::{CategorySearchTool, ListCategoriesTool, ListConceptsInCategoryTool};
pub use concept_browse::{
    ConceptChunksTool, ConceptSearchTool, ExtractConceptsTool, SourceConceptsTool,
};
pub use guidance::GetGuidanceTool;

/// `{content: [{type: "text", text: JSON}], isError: bool}` (§4.14 step 3).
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolResult {
    pub fn ok(value: impl Serialize) -> Self {
        let text = serde_json::to_string(&value).unwrap_or_else(|e| {
            serde_json::json!({"error": {"code": "serialize_failed", "message": e.to_string()}})
                .to_string()
        });
        Self {
            content: vec![ToolContent::Text { text }],
            is_error: false,
        }
    }

    /// §7 error shape: `{error: {code, message, field?, type?}, timestamp}`.
    pub fn error(code: &str, message: impl Into<String>, field: Option<&str>) -> Self {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message.into(),
                "field": field,
            },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        Self {
            content: vec![ToolContent::Text {
                text: body.to_string(),
            }],
            is_error: true,
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> Value;
    async fn call(&self, arguments: Value) -> ToolResult;
}

/// Required-field accessor shared by every tool's parameter parsing, so a
/// missing `query`/`name`/etc. always produces the same `{error: {code:
/// "missing_field", field}}` shape instead of a bespoke message per tool.
pub fn require_str<'a>(arguments: &'a Value, field: &str) -> Result<&'a str, ToolResult> {
    arguments
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolResult::error("missing_field", "required field missing", Some(field)))
}

pub fn optional_usize(arguments: &Value, field: &str, default: usize) -> usize {
    arguments
        .get(field)
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(default)
}

pub fn optional_str<'a>(arguments: &'a Value, field: &str) -> Option<&'a str> {
    arguments.get(field).and_then(|v| v.as_str())
}

/// Holds every registered tool so `list_tools` / `call_tool` (§6) can
/// dispatch by name without the CLI's RPC layer knowing each tool's type.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Box<dyn Tool>>) -> Self {
        Self { tools }
    }

    pub fn definitions(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "inputSchema": t.input_schema(),
                })
            })
            .collect()
    }

    pub async fn call(&self, name: &str, arguments: Value) -> ToolResult {
        match self.tools.iter().find(|t| t.name() == name) {
            Some(tool) => tool.call(arguments).await,
            None => ToolResult::error("unknown_tool", format!("no such tool: {name}"), None),
        }
    }
}
