//! Storage adapter (C2): open/create on startup, insert via
//! `RecordBatchIterator`, delete via SQL-ish predicates, vector search
//! via `nearest_to` + cosine distance -> score, across the four tables
//! (§3). Tables are bootstrapped directly through `create_empty_table`
//! rather than the synthetic seed-row-then-delete trick older LanceDB
//! bindings needed.

use super::codec;
use super::schema;
use crate::error::StorageError;
use crate::types::{CatalogRow, CategoryRow, ChunkRow, ConceptRow};
use arrow_array::{Float32Array, RecordBatch, RecordBatchIterator};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::path::Path;
use std::sync::Arc;

pub struct StorageEngine {
    db: lancedb::Connection,
    dimension: usize,
}

/// A row paired with its hybrid-relevant similarity score (1 - cosine distance).
#[derive(Debug, Clone)]
pub struct Scored<T> {
    pub row: T,
    pub score: f32,
}

impl StorageEngine {
    pub async fn open_or_create(path: &Path, dimension: usize) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path).map_err(|e| StorageError::Io(e.to_string()))?;
        let db = lancedb::connect(&path.to_string_lossy())
            .execute()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let engine = Self { db, dimension };
        engine
            .ensure_table(schema::CATALOG_TABLE, schema::catalog_schema(dimension))
            .await?;
        engine
            .ensure_table(schema::CHUNKS_TABLE, schema::chunks_schema(dimension))
            .await?;
        engine
            .ensure_table(schema::CONCEPTS_TABLE, schema::concepts_schema(dimension))
            .await?;
        engine
            .ensure_table(schema::CATEGORIES_TABLE, schema::categories_schema())
            .await?;
        Ok(engine)
    }

    async fn ensure_table(
        &self,
        name: &str,
        arrow_schema: Arc<arrow_schema::Schema>,
    ) -> Result<(), StorageError> {
        let names = self
            .db
            .table_names()
            .execute()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        if names.iter().any(|n| n == name) {
            return Ok(());
        }
        let empty = RecordBatchIterator::new(Vec::<Result<RecordBatch, arrow_schema::ArrowError>>::new(), arrow_schema.clone());
        self.db
            .create_table(name, Box::new(empty))
            .execute()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(())
    }

    async fn open(&self, name: &str) -> Result<lancedb::Table, StorageError> {
        self.db
            .open_table(name)
            .execute()
            .await
            .map_err(|_| StorageError::TableNotFound(name.to_string()))
    }

    async fn insert_batch(&self, table: &str, batch: RecordBatch) -> Result<(), StorageError> {
        if batch.num_rows() == 0 {
            return Ok(());
        }
        let t = self.open(table).await?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);
        t.add(Box::new(reader))
            .execute()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(())
    }

    pub async fn insert_catalog(&self, rows: &[CatalogRow]) -> Result<(), StorageError> {
        self.insert_batch(
            schema::CATALOG_TABLE,
            codec::encode_catalog(rows, self.dimension)?,
        )
        .await
    }

    pub async fn insert_chunks(&self, rows: &[ChunkRow]) -> Result<(), StorageError> {
        self.insert_batch(
            schema::CHUNKS_TABLE,
            codec::encode_chunks(rows, self.dimension)?,
        )
        .await
    }

    pub async fn insert_concepts(&self, rows: &[ConceptRow]) -> Result<(), StorageError> {
        self.insert_batch(
            schema::CONCEPTS_TABLE,
            codec::encode_concepts(rows, self.dimension)?,
        )
        .await
    }

    pub async fn insert_categories(&self, rows: &[CategoryRow]) -> Result<(), StorageError> {
        self.insert_batch(schema::CATEGORIES_TABLE, codec::encode_categories(rows)?)
            .await
    }

    /// Delete-then-insert replace, keyed by an equality predicate on one
    /// column (e.g. `id = 42`). Used for re-ingestion of a changed document
    /// (L2: same hash -> idempotent, different hash -> replace).
    pub async fn upsert_by(
        &self,
        table: &str,
        predicate: &str,
        batch: RecordBatch,
    ) -> Result<(), StorageError> {
        self.delete_where(table, predicate).await?;
        self.insert_batch(table, batch).await
    }

    pub async fn delete_where(&self, table: &str, predicate: &str) -> Result<usize, StorageError> {
        let t = self.open(table).await?;
        let before = t.count_rows(None).await.unwrap_or(0);
        t.delete(predicate)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        let after = t.count_rows(None).await.unwrap_or(0);
        Ok(before.saturating_sub(after))
    }

    pub async fn count(&self, table: &str) -> Result<usize, StorageError> {
        let t = self.open(table).await?;
        t.count_rows(None)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    async fn vector_search_batches(
        &self,
        table: &str,
        query: &[f32],
        k: usize,
        filter: Option<&str>,
    ) -> Result<Vec<RecordBatch>, StorageError> {
        let t = self.open(table).await?;
        let mut q = t
            .query()
            .nearest_to(query)
            .map_err(|e| StorageError::Io(e.to_string()))?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(k);
        if let Some(pred) = filter {
            q = q.only_if(pred);
        }
        let stream = q
            .execute()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        stream
            .try_collect()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    fn scores_from(batches: &[RecordBatch]) -> Vec<f32> {
        let mut scores = Vec::new();
        for batch in batches {
            if let Some(d) = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            {
                for i in 0..batch.num_rows() {
                    scores.push((1.0 - d.value(i)).max(0.0));
                }
            } else {
                scores.extend(std::iter::repeat(0.0).take(batch.num_rows()));
            }
        }
        scores
    }

    pub async fn vector_search_catalog(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&str>,
    ) -> Result<Vec<Scored<CatalogRow>>, StorageError> {
        let batches = self
            .vector_search_batches(schema::CATALOG_TABLE, query, k, filter)
            .await?;
        let scores = Self::scores_from(&batches);
        let mut rows = Vec::new();
        for batch in &batches {
            rows.extend(codec::decode_catalog(batch)?);
        }
        Ok(rows
            .into_iter()
            .zip(scores)
            .map(|(row, score)| Scored { row, score })
            .collect())
    }

    pub async fn vector_search_chunks(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&str>,
    ) -> Result<Vec<Scored<ChunkRow>>, StorageError> {
        let batches = self
            .vector_search_batches(schema::CHUNKS_TABLE, query, k, filter)
            .await?;
        let scores = Self::scores_from(&batches);
        let mut rows = Vec::new();
        for batch in &batches {
            rows.extend(codec::decode_chunks(batch)?);
        }
        Ok(rows
            .into_iter()
            .zip(scores)
            .map(|(row, score)| Scored { row, score })
            .collect())
    }

    pub async fn vector_search_concepts(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&str>,
    ) -> Result<Vec<Scored<ConceptRow>>, StorageError> {
        let batches = self
            .vector_search_batches(schema::CONCEPTS_TABLE, query, k, filter)
            .await?;
        let scores = Self::scores_from(&batches);
        let mut rows = Vec::new();
        for batch in &batches {
            rows.extend(codec::decode_concepts(batch)?);
        }
        Ok(rows
            .into_iter()
            .zip(scores)
            .map(|(row, score)| Scored { row, score })
            .collect())
    }

    async fn scan(
        &self,
        table: &str,
        predicate: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<RecordBatch>, StorageError> {
        let t = self.open(table).await?;
        let mut q = t.query();
        if let Some(pred) = predicate {
            q = q.only_if(pred);
        }
        if let Some(l) = limit {
            q = q.limit(l);
        }
        let stream = q
            .execute()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        stream
            .try_collect()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    pub async fn scan_catalog(
        &self,
        predicate: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogRow>, StorageError> {
        let batches = self.scan(schema::CATALOG_TABLE, predicate, limit).await?;
        let mut rows = Vec::new();
        for b in &batches {
            rows.extend(codec::decode_catalog(b)?);
        }
        Ok(rows)
    }

    pub async fn scan_chunks(
        &self,
        predicate: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ChunkRow>, StorageError> {
        let batches = self.scan(schema::CHUNKS_TABLE, predicate, limit).await?;
        let mut rows = Vec::new();
        for b in &batches {
            rows.extend(codec::decode_chunks(b)?);
        }
        Ok(rows)
    }

    pub async fn scan_concepts(
        &self,
        predicate: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ConceptRow>, StorageError> {
        let batches = self.scan(schema::CONCEPTS_TABLE, predicate, limit).await?;
        let mut rows = Vec::new();
        for b in &batches {
            rows.extend(codec::decode_concepts(b)?);
        }
        Ok(rows)
    }

    pub async fn scan_categories(
        &self,
        predicate: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<CategoryRow>, StorageError> {
        let batches = self.scan(schema::CATEGORIES_TABLE, predicate, limit).await?;
        let mut rows = Vec::new();
        for b in &batches {
            rows.extend(codec::decode_categories(b)?);
        }
        Ok(rows)
    }

    /// Build an ANN index once a table has enough rows to benefit (§4.2 / B2).
    /// Below that floor, LanceDB's brute-force scan is both fast enough and
    /// exact, and building an IVF-PQ index on a handful of rows just adds
    /// startup latency for no recall benefit.
    pub async fn build_vector_index_if_needed(
        &self,
        table: &str,
        min_rows: usize,
    ) -> Result<(), StorageError> {
        let count = self.count(table).await?;
        if count < min_rows {
            return Ok(());
        }
        let t = self.open(table).await?;
        t.create_index(&["vector"], lancedb::index::Index::Auto)
            .execute()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tracing::info!(table, rows = count, "built vector index");
        Ok(())
    }
}
