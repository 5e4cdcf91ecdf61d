pub mod enricher;
pub mod extractor;
pub mod indexer;

pub use enricher::enrich_chunk_concepts;
pub use extractor::ConceptExtractor;
pub use indexer::ConceptIndexer;
