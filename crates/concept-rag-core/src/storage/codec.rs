//! Row <-> RecordBatch conversions (C3). One pair of functions per table:
//! `encode_*` builds the single RecordBatch LanceDB wants for an insert,
//! `decode_*` walks a batch back into typed rows. JSON columns use
//! `serde_json` directly; malformed JSON becomes a `StorageError::RowSchema`
//! rather than a panic, since a corrupt row should not take the whole scan
//! down with it.

use crate::error::StorageError;
use crate::types::{CatalogRow, CategoryRow, ChunkRow, ConceptRow, ConceptType, EnrichmentSource};
use arrow_array::{
    Array, Float32Array, Int64Array, RecordBatch, StringArray, UInt32Array,
    FixedSizeListArray,
};
use std::sync::Arc;

fn vector_array(vectors: &[Vec<f32>], dimension: usize) -> FixedSizeListArray {
    let flat: Vec<f32> = vectors.iter().flat_map(|v| v.iter().copied()).collect();
    let values = Float32Array::from(flat);
    let item_field = arrow_schema::Field::new("item", arrow_schema::DataType::Float32, true);
    FixedSizeListArray::new(
        Arc::new(item_field),
        dimension as i32,
        Arc::new(values) as Arc<dyn Array>,
        None,
    )
}

fn column_str<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, StorageError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| StorageError::RowSchema {
            field: name.to_string(),
            row_id: "<batch>".to_string(),
            message: "missing or wrong-typed column".to_string(),
        })
}

fn column_i64<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array, StorageError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| StorageError::RowSchema {
            field: name.to_string(),
            row_id: "<batch>".to_string(),
            message: "missing or wrong-typed column".to_string(),
        })
}

fn column_u32<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array, StorageError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
        .ok_or_else(|| StorageError::RowSchema {
            field: name.to_string(),
            row_id: "<batch>".to_string(),
            message: "missing or wrong-typed column".to_string(),
        })
}

fn column_f32<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float32Array, StorageError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| StorageError::RowSchema {
            field: name.to_string(),
            row_id: "<batch>".to_string(),
            message: "missing or wrong-typed column".to_string(),
        })
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str, field: &str, row_id: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::RowSchema {
        field: field.to_string(),
        row_id: row_id.to_string(),
        message: e.to_string(),
    })
}

pub fn encode_catalog(rows: &[CatalogRow], dimension: usize) -> Result<RecordBatch, StorageError> {
    let schema = super::schema::catalog_schema(dimension);
    let ids = Int64Array::from(rows.iter().map(|r| r.id).collect::<Vec<_>>());
    let sources = StringArray::from(rows.iter().map(|r| r.source.clone()).collect::<Vec<_>>());
    let hashes = StringArray::from(rows.iter().map(|r| r.hash.clone()).collect::<Vec<_>>());
    let texts = StringArray::from(rows.iter().map(|r| r.text.clone()).collect::<Vec<_>>());
    let concepts_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.concepts).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let categories_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.concept_categories).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let loc_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.loc).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let vectors: Vec<Vec<f32>> = rows.iter().map(|r| r.vector.clone()).collect();
    let vector_arr = vector_array(&vectors, dimension);

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(ids),
            Arc::new(sources),
            Arc::new(hashes),
            Arc::new(texts),
            Arc::new(concepts_json),
            Arc::new(categories_json),
            Arc::new(loc_json),
            Arc::new(vector_arr),
        ],
    )
    .map_err(|e| StorageError::Io(e.to_string()))
}

pub fn decode_catalog(batch: &RecordBatch) -> Result<Vec<CatalogRow>, StorageError> {
    let ids = column_i64(batch, "id")?;
    let sources = column_str(batch, "source")?;
    let hashes = column_str(batch, "hash")?;
    let texts = column_str(batch, "text")?;
    let concepts_json = column_str(batch, "concepts_json")?;
    let categories_json = column_str(batch, "concept_categories_json")?;
    let loc_json = column_str(batch, "loc_json")?;

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let id = ids.value(i);
        out.push(CatalogRow {
            id,
            source: sources.value(i).to_string(),
            hash: hashes.value(i).to_string(),
            text: texts.value(i).to_string(),
            concepts: parse_json(concepts_json.value(i), "concepts_json", &id.to_string())?,
            concept_categories: parse_json(
                categories_json.value(i),
                "concept_categories_json",
                &id.to_string(),
            )?,
            loc: parse_json(loc_json.value(i), "loc_json", &id.to_string())?,
            vector: Vec::new(),
        });
    }
    Ok(out)
}

pub fn encode_chunks(rows: &[ChunkRow], dimension: usize) -> Result<RecordBatch, StorageError> {
    let schema = super::schema::chunks_schema(dimension);
    let ids = Int64Array::from(rows.iter().map(|r| r.id).collect::<Vec<_>>());
    let catalog_ids = Int64Array::from(rows.iter().map(|r| r.catalog_id).collect::<Vec<_>>());
    let texts = StringArray::from(rows.iter().map(|r| r.text.clone()).collect::<Vec<_>>());
    let hashes = StringArray::from(rows.iter().map(|r| r.hash.clone()).collect::<Vec<_>>());
    let loc_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.loc).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let concept_ids_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.concept_ids).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let categories_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.concept_categories).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let densities = Float32Array::from(rows.iter().map(|r| r.concept_density).collect::<Vec<_>>());
    let vectors: Vec<Vec<f32>> = rows.iter().map(|r| r.vector.clone()).collect();
    let vector_arr = vector_array(&vectors, dimension);

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(ids),
            Arc::new(catalog_ids),
            Arc::new(texts),
            Arc::new(hashes),
            Arc::new(loc_json),
            Arc::new(concept_ids_json),
            Arc::new(categories_json),
            Arc::new(densities),
            Arc::new(vector_arr),
        ],
    )
    .map_err(|e| StorageError::Io(e.to_string()))
}

pub fn decode_chunks(batch: &RecordBatch) -> Result<Vec<ChunkRow>, StorageError> {
    let ids = column_i64(batch, "id")?;
    let catalog_ids = column_i64(batch, "catalog_id")?;
    let texts = column_str(batch, "text")?;
    let hashes = column_str(batch, "hash")?;
    let loc_json = column_str(batch, "loc_json")?;
    let concept_ids_json = column_str(batch, "concept_ids_json")?;
    let categories_json = column_str(batch, "concept_categories_json")?;
    let densities = column_f32(batch, "concept_density")?;

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let id = ids.value(i);
        out.push(ChunkRow {
            id,
            catalog_id: catalog_ids.value(i),
            text: texts.value(i).to_string(),
            hash: hashes.value(i).to_string(),
            loc: parse_json(loc_json.value(i), "loc_json", &id.to_string())?,
            concept_ids: parse_json(concept_ids_json.value(i), "concept_ids_json", &id.to_string())?,
            concept_categories: parse_json(
                categories_json.value(i),
                "concept_categories_json",
                &id.to_string(),
            )?,
            concept_density: densities.value(i),
            vector: Vec::new(),
        });
    }
    Ok(out)
}

pub fn encode_concepts(rows: &[ConceptRow], dimension: usize) -> Result<RecordBatch, StorageError> {
    let schema = super::schema::concepts_schema(dimension);
    let ids = Int64Array::from(rows.iter().map(|r| r.id).collect::<Vec<_>>());
    let concepts = StringArray::from(rows.iter().map(|r| r.concept.clone()).collect::<Vec<_>>());
    let concept_types = StringArray::from(
        rows.iter()
            .map(|r| match r.concept_type {
                ConceptType::Thematic => "thematic",
                ConceptType::Terminology => "terminology",
            })
            .collect::<Vec<_>>(),
    );
    let categories = StringArray::from(rows.iter().map(|r| r.category.clone()).collect::<Vec<_>>());
    let sources_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.sources).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let catalog_ids_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.catalog_ids).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let related_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.related_concepts).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let synonyms_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.synonyms).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let broader_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.broader_terms).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let narrower_json = StringArray::from(
        rows.iter()
            .map(|r| serde_json::to_string(&r.narrower_terms).unwrap_or_default())
            .collect::<Vec<_>>(),
    );
    let weights = Float32Array::from(rows.iter().map(|r| r.weight).collect::<Vec<_>>());
    let chunk_counts = UInt32Array::from(rows.iter().map(|r| r.chunk_count).collect::<Vec<_>>());
    let enrichment = StringArray::from(
        rows.iter()
            .map(|r| match r.enrichment_source {
                EnrichmentSource::Corpus => "corpus",
                EnrichmentSource::Wordnet => "wordnet",
                EnrichmentSource::Hybrid => "hybrid",
            })
            .collect::<Vec<_>>(),
    );
    let vectors: Vec<Vec<f32>> = rows.iter().map(|r| r.vector.clone()).collect();
    let vector_arr = vector_array(&vectors, dimension);

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(ids),
            Arc::new(concepts),
            Arc::new(concept_types),
            Arc::new(categories),
            Arc::new(sources_json),
            Arc::new(catalog_ids_json),
            Arc::new(related_json),
            Arc::new(synonyms_json),
            Arc::new(broader_json),
            Arc::new(narrower_json),
            Arc::new(weights),
            Arc::new(chunk_counts),
            Arc::new(enrichment),
            Arc::new(vector_arr),
        ],
    )
    .map_err(|e| StorageError::Io(e.to_string()))
}

pub fn decode_concepts(batch: &RecordBatch) -> Result<Vec<ConceptRow>, StorageError> {
    let ids = column_i64(batch, "id")?;
    let concepts = column_str(batch, "concept")?;
    let concept_types = column_str(batch, "concept_type")?;
    let categories = column_str(batch, "category")?;
    let sources_json = column_str(batch, "sources_json")?;
    let catalog_ids_json = column_str(batch, "catalog_ids_json")?;
    let related_json = column_str(batch, "related_concepts_json")?;
    let synonyms_json = column_str(batch, "synonyms_json")?;
    let broader_json = column_str(batch, "broader_terms_json")?;
    let narrower_json = column_str(batch, "narrower_terms_json")?;
    let weights = column_f32(batch, "weight")?;
    let chunk_counts = column_u32(batch, "chunk_count")?;
    let enrichment = column_str(batch, "enrichment_source")?;

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let id = ids.value(i);
        let row_id = id.to_string();
        out.push(ConceptRow {
            id,
            concept: concepts.value(i).to_string(),
            concept_type: match concept_types.value(i) {
                "terminology" => ConceptType::Terminology,
                _ => ConceptType::Thematic,
            },
            category: categories.value(i).to_string(),
            sources: parse_json(sources_json.value(i), "sources_json", &row_id)?,
            catalog_ids: parse_json(catalog_ids_json.value(i), "catalog_ids_json", &row_id)?,
            related_concepts: parse_json(related_json.value(i), "related_concepts_json", &row_id)?,
            synonyms: parse_json(synonyms_json.value(i), "synonyms_json", &row_id)?,
            broader_terms: parse_json(broader_json.value(i), "broader_terms_json", &row_id)?,
            narrower_terms: parse_json(narrower_json.value(i), "narrower_terms_json", &row_id)?,
            weight: weights.value(i),
            chunk_count: chunk_counts.value(i),
            enrichment_source: match enrichment.value(i) {
                "wordnet" => EnrichmentSource::Wordnet,
                "hybrid" => EnrichmentSource::Hybrid,
                _ => EnrichmentSource::Corpus,
            },
            vector: Vec::new(),
        });
    }
    Ok(out)
}

pub fn encode_categories(rows: &[CategoryRow]) -> Result<RecordBatch, StorageError> {
    let schema = super::schema::categories_schema();
    let ids = Int64Array::from(rows.iter().map(|r| r.id).collect::<Vec<_>>());
    let names = StringArray::from(rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>());
    let aliases = StringArray::from(rows.iter().map(|r| r.alias.clone()).collect::<Vec<_>>());
    let parent_ids = Int64Array::from(rows.iter().map(|r| r.parent_id).collect::<Vec<_>>());
    let doc_counts = UInt32Array::from(rows.iter().map(|r| r.document_count).collect::<Vec<_>>());
    let concept_counts = UInt32Array::from(rows.iter().map(|r| r.concept_count).collect::<Vec<_>>());

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(ids),
            Arc::new(names),
            Arc::new(aliases),
            Arc::new(parent_ids),
            Arc::new(doc_counts),
            Arc::new(concept_counts),
        ],
    )
    .map_err(|e| StorageError::Io(e.to_string()))
}

pub fn decode_categories(batch: &RecordBatch) -> Result<Vec<CategoryRow>, StorageError> {
    let ids = column_i64(batch, "id")?;
    let names = column_str(batch, "name")?;
    let aliases = column_str(batch, "alias")?;
    let parent_ids = column_i64(batch, "parent_id")?;
    let doc_counts = column_u32(batch, "document_count")?;
    let concept_counts = column_u32(batch, "concept_count")?;

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        out.push(CategoryRow {
            id: ids.value(i),
            name: names.value(i).to_string(),
            alias: aliases.value(i).to_string(),
            parent_id: if parent_ids.is_null(i) {
                None
            } else {
                Some(parent_ids.value(i))
            },
            document_count: doc_counts.value(i),
            concept_count: concept_counts.value(i),
        });
    }
    Ok(out)
}
