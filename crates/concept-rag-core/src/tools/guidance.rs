//! `get_guidance` (§4.14): static agent-usage guidance, no domain service
//! behind it — purely a documentation tool so an agent can discover how the
//! rest of the tool surface fits together without out-of-band docs.

use crate::tools::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::Value;

const GUIDANCE: &str = "\
This knowledge base indexes your personal documents by concept, not just by \
keyword. Typical workflow:

1. Start broad with `catalog_search` to find relevant documents by summary.
2. Use `chunks_search` on a specific source once you know which document \
matters, or `broad_chunks_search` to search every chunk in the corpus at \
once.
3. Use `concept_search` to discover how a topic is named in this corpus \
before searching for it, then `concept_chunks` to pull every chunk tagged \
with that concept.
4. Use `list_categories` / `list_concepts_in_category` to browse the \
vocabulary when you don't have a specific query yet.
5. Use `extract_concepts` to see a document's full concept metadata \
(primary concepts, categories, related concepts, technical terms) without \
re-reading the whole document.

Search results are ranked by a hybrid score combining vector similarity, \
keyword relevance, title match, concept overlap, and thesaurus expansion — \
a low score does not mean irrelevant, just less central.\
";

pub struct GetGuidanceTool;

#[async_trait]
impl Tool for GetGuidanceTool {
    fn name(&self) -> &str {
        "get_guidance"
    }

    fn description(&self) -> &str {
        "Return static guidance on how to use this tool surface effectively."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _arguments: Value) -> ToolResult {
        ToolResult::ok(serde_json::json!({ "guidance": GUIDANCE }))
    }
}
