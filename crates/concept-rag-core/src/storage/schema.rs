//! Arrow schemas for the four persistent tables (§3). Scalar columns get
//! native Arrow types; nested/variable-shape fields (lists, sub-objects)
//! are stored as JSON text columns (`metadata_json`/`citation_json` and
//! friends) — Arrow's `ListArray` machinery buys little here since every
//! consumer round-trips through `serde` anyway.

use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const CATALOG_TABLE: &str = "catalog";
pub const CHUNKS_TABLE: &str = "chunks";
pub const CONCEPTS_TABLE: &str = "concepts";
pub const CATEGORIES_TABLE: &str = "categories";

fn vector_field(dimension: usize) -> Field {
    Field::new(
        "vector",
        DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dimension as i32),
        false,
    )
}

pub fn catalog_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("hash", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("concepts_json", DataType::Utf8, false),
        Field::new("concept_categories_json", DataType::Utf8, false),
        Field::new("loc_json", DataType::Utf8, false),
        vector_field(dimension),
    ]))
}

pub fn chunks_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("catalog_id", DataType::Int64, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("hash", DataType::Utf8, false),
        Field::new("loc_json", DataType::Utf8, false),
        Field::new("concept_ids_json", DataType::Utf8, false),
        Field::new("concept_categories_json", DataType::Utf8, false),
        Field::new("concept_density", DataType::Float32, false),
        vector_field(dimension),
    ]))
}

pub fn concepts_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("concept", DataType::Utf8, false),
        Field::new("concept_type", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("sources_json", DataType::Utf8, false),
        Field::new("catalog_ids_json", DataType::Utf8, false),
        Field::new("related_concepts_json", DataType::Utf8, false),
        Field::new("synonyms_json", DataType::Utf8, false),
        Field::new("broader_terms_json", DataType::Utf8, false),
        Field::new("narrower_terms_json", DataType::Utf8, false),
        Field::new("weight", DataType::Float32, false),
        Field::new("chunk_count", DataType::UInt32, false),
        Field::new("enrichment_source", DataType::Utf8, false),
        vector_field(dimension),
    ]))
}

pub fn categories_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("alias", DataType::Utf8, false),
        Field::new("parent_id", DataType::Int64, true),
        Field::new("document_count", DataType::UInt32, false),
        Field::new("concept_count", DataType::UInt32, false),
    ]))
}
