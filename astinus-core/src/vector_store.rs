//! Vector store interface: key/metadata/document/embedding indexing with
//! cosine-similarity query, plus an in-memory reference implementation.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("backend error: {0}")]
    Backend(String),
}

/// One indexed item: a document, its embedding, free-form metadata, and an
/// id unique within its collection.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: String,
    pub document: String,
    pub embedding: Vec<f32>,
    pub metadata: HashMap<String, Value>,
}

/// A single nearest-neighbor hit: the record plus its similarity score.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub record: Record,
    pub score: f32,
}

/// Collection-scoped embedding index with cosine-similarity query.
///
/// Collections are created lazily on first write (`get_or_create_collection`
/// followed by `add`). Implementors must tolerate concurrent use from
/// multiple sessions.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Ensure `collection` exists; idempotent.
    async fn get_or_create_collection(&self, collection: &str) -> Result<(), VectorStoreError>;

    /// Insert or overwrite a record with the given `id` into `collection`.
    async fn add(
        &self,
        collection: &str,
        id: &str,
        document: &str,
        embedding: Vec<f32>,
        metadata: HashMap<String, Value>,
    ) -> Result<(), VectorStoreError>;

    /// Return the `k` records in `collection` most similar to `embedding`,
    /// sorted by descending cosine similarity.
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<QueryMatch>, VectorStoreError>;

    /// Remove a record by id. No-op if the id is absent.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), VectorStoreError>;
}

/// L2 norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity between two vectors of equal length. Returns `0.0` if
/// either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (na, nb) = (l2_norm(a), l2_norm(b));
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (na * nb)
}

/// Brute-force in-memory [`VectorStore`]: a `RwLock<HashMap<collection,
/// Vec<Record>>>`, scanned in full on every query. Adequate for a single
/// world pack's lore/memory collections; not meant to scale past a few
/// thousand records per collection.
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn get_or_create_collection(&self, collection: &str) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().unwrap();
        collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn add(
        &self,
        collection: &str,
        id: &str,
        document: &str,
        embedding: Vec<f32>,
        metadata: HashMap<String, Value>,
    ) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().unwrap();
        let records = collections.entry(collection.to_string()).or_default();
        records.retain(|r| r.id != id);
        records.push(Record {
            id: id.to_string(),
            document: document.to_string(),
            embedding,
            metadata,
        });
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<QueryMatch>, VectorStoreError> {
        let collections = self.collections.read().unwrap();
        let records = match collections.get(collection) {
            Some(r) => r,
            None => return Ok(Vec::new()),
        };

        let mut matches: Vec<QueryMatch> = records
            .iter()
            .map(|r| QueryMatch {
                record: r.clone(),
                score: cosine_similarity(embedding, &r.embedding),
            })
            .collect();
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        matches.truncate(k);
        Ok(matches)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().unwrap();
        if let Some(records) = collections.get_mut(collection) {
            records.retain(|r| r.id != id);
        }
        Ok(())
    }
}
