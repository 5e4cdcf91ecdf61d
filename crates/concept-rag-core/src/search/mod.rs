pub mod expander;
pub mod hybrid;
pub mod thesaurus;

pub use expander::{ExpandedQuery, QueryExpander};
pub use hybrid::{HybridSearch, SearchHit};
pub use thesaurus::{InMemoryThesaurus, ThesaurusEntry, ThesaurusLookup};
