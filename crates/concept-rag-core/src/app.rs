//! Application wiring (C15, §4.15): the composition root. Builds the
//! embedding provider, opens the four columnar tables, constructs the
//! search/ingest services on top of them, and assembles the tool
//! registry the CLI's RPC server dispatches against, in that fixed
//! dependency order: embeddings before storage, storage before search.

use crate::cache::{Checkpoint, StageCache};
use crate::concepts::{ConceptExtractor, ConceptIndexer};
use crate::config::ConceptRagConfig;
use crate::embeddings::{build_embedder, EmbeddingModel};
use crate::error::ConceptRagError;
use crate::ingest::IngestContext;
use crate::llm::client::ReqwestLlmClient;
use crate::llm::LlmClient;
use crate::processing::{DocumentLoader, NullOcrInvoker, TextChunker};
use crate::search::{HybridSearch, InMemoryThesaurus, QueryExpander, ThesaurusLookup};
use crate::storage::StorageEngine;
use crate::tools::{
    BroadChunksSearchTool, CatalogSearchTool, CategorySearchTool, ChunksSearchTool,
    ConceptChunksTool, ConceptSearchTool, ExtractConceptsTool, GetGuidanceTool,
    ListCategoriesTool, ListConceptsInCategoryTool, SourceConceptsTool, Tool, ToolRegistry,
};
use std::path::Path;
use std::sync::Arc;

/// Everything a long-lived process (CLI ingest run, tool server) needs,
/// built once at startup in dependency order.
pub struct Application {
    pub config: ConceptRagConfig,
    pub storage: Arc<StorageEngine>,
    pub embedder: Arc<dyn EmbeddingModel>,
    pub llm: Arc<dyn LlmClient>,
    pub thesaurus: Arc<dyn ThesaurusLookup>,
    pub hybrid_search: Arc<HybridSearch>,
    pub concept_indexer: Arc<ConceptIndexer>,
    pub tools: ToolRegistry,
}

impl Application {
    /// Embedding provider → storage adapter → services → tool registry,
    /// in that order (§4.15).
    pub async fn bootstrap(config: ConceptRagConfig) -> Result<Self, ConceptRagError> {
        config
            .validate()
            .map_err(|msg| ConceptRagError::Validation(crate::error::ValidationError::BadFormat {
                field: "config".to_string(),
                message: msg,
            }))?;

        let embedder = build_embedder(&config.embedding)?;

        let storage = Arc::new(
            StorageEngine::open_or_create(&config.db_path, config.embedding.dimension)
                .await
                .map_err(ConceptRagError::from)?,
        );

        let thesaurus: Arc<dyn ThesaurusLookup> = Arc::new(InMemoryThesaurus::empty());

        let expander = QueryExpander::new(storage.clone(), thesaurus.clone());
        let hybrid_search = Arc::new(HybridSearch::new(
            storage.clone(),
            embedder.clone(),
            expander,
            config.search.clone(),
        ));

        let llm: Arc<dyn LlmClient> = Arc::new(ReqwestLlmClient::new(config.llm.clone()));

        let concept_indexer = Arc::new(ConceptIndexer::new(
            storage.clone(),
            embedder.clone(),
            thesaurus.clone(),
        ));

        let tools = build_tool_registry(hybrid_search.clone(), storage.clone());

        Ok(Self {
            config,
            storage,
            embedder,
            llm,
            thesaurus,
            hybrid_search,
            concept_indexer,
            tools,
        })
    }

    /// Builds an `IngestContext` for a single ingest run. Separate from
    /// `bootstrap` because the ingest path needs per-run collaborators
    /// (chunker, loader, extractor, stage cache) the query path never
    /// touches.
    pub fn ingest_context(&self) -> Result<IngestContext, ConceptRagError> {
        let loader = Arc::new(DocumentLoader::new(
            Box::new(NullOcrInvoker),
            self.config.ingest.ocr_doc_timeout_secs,
            self.config.ingest.ocr_page_timeout_secs,
        ));
        let chunker = TextChunker::new(
            self.config.chunking.chunk_size,
            self.config.chunking.chunk_overlap,
            self.config.chunking.min_chunk_size,
        );
        let extractor = ConceptExtractor::new(
            self.llm.clone(),
            self.config.ingest.chunk_mode_token_threshold,
        );
        let stage_cache = Arc::new(
            StageCache::new(&self.config.db_path, self.config.cache.ttl_days)
                .map_err(ConceptRagError::from)?,
        );

        Ok(IngestContext {
            config: self.config.clone(),
            storage: self.storage.clone(),
            embedder: self.embedder.clone(),
            llm: self.llm.clone(),
            loader,
            chunker,
            extractor,
            stage_cache,
        })
    }

    pub fn load_checkpoint(&self, files_dir: &Path) -> Result<Checkpoint, ConceptRagError> {
        Checkpoint::load(&self.config.db_path, &files_dir.to_string_lossy())
            .map_err(ConceptRagError::from)
    }

    /// Drops every row of the four tables (§6 `--overwrite`). Leaves the
    /// tables themselves open so ingest can write into them immediately.
    pub async fn purge_tables(&self) -> Result<(), ConceptRagError> {
        for table in ["catalog", "chunks", "concepts", "categories"] {
            self.storage.delete_where(table, "id >= 0").await.map_err(ConceptRagError::from)?;
        }
        Ok(())
    }
}

fn build_tool_registry(search: Arc<HybridSearch>, storage: Arc<StorageEngine>) -> ToolRegistry {
    let tools: Vec<Box<dyn Tool>> = vec![
        Box::new(CatalogSearchTool::new(search.clone())),
        Box::new(ChunksSearchTool::new(search.clone(), storage.clone())),
        Box::new(BroadChunksSearchTool::new(search.clone())),
        Box::new(ConceptSearchTool::new(storage.clone())),
        Box::new(ConceptChunksTool::new(storage.clone())),
        Box::new(SourceConceptsTool::new(storage.clone())),
        Box::new(ExtractConceptsTool::new(storage.clone())),
        Box::new(CategorySearchTool::new(search.clone())),
        Box::new(ListCategoriesTool::new(storage.clone())),
        Box::new(ListConceptsInCategoryTool::new(storage.clone())),
        Box::new(GetGuidanceTool),
    ];
    ToolRegistry::new(tools)
}
