#![deny(missing_docs)]
//! In-memory vector store (`§4.2`, C2).
//!
//! Keyed by `uri`, searched by linear scan — at the tens-to-low-hundreds
//! scale this core targets, an ANN index would be pure overhead. Embeddings
//! are kept as little-endian `f32` blobs and decoded positionally on read,
//! not by field name, so the storage layout can change without touching the
//! search path.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::warn;
use weave_types::{IndexedKind, IndexedMetadata, SearchHit, VectorStoreError, VectorStoreStats};

/// Maximum length of the stored text preview, per the spec's payload shape.
pub const TEXT_PREVIEW_LIMIT: usize = 10_000;

/// One stored row. Fields are read positionally via [`Row::columns`] by the
/// search path, mirroring a tabular backing store's stable contract.
struct Row {
    uri: String,
    blob: Vec<u8>,
    text_preview: String,
    full_text_length: usize,
    indexed_at: i64,
    embedding_dim: usize,
    kind: IndexedKind,
}

impl Row {
    /// Positional view used by `search`: (blob, preview, dim, indexed_at, full_len, kind).
    fn columns(&self) -> (&[u8], &str, usize, i64, usize, IndexedKind) {
        (
            &self.blob,
            &self.text_preview,
            self.embedding_dim,
            self.indexed_at,
            self.full_text_length,
            self.kind,
        )
    }
}

fn encode_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Decode a little-endian `f32` blob. Returns `None` (and the caller logs a
/// warning) if the blob length isn't a multiple of 4 — a corrupt row.
fn decode_blob(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

struct Table {
    rows: Vec<Row>,
    index: HashMap<String, usize>,
}

/// In-memory, process-lifetime vector store. Cleared on server switch, not
/// persisted across restarts (`§1` Non-goals).
pub struct VectorStore {
    table: RwLock<Option<Table>>,
}

impl VectorStore {
    /// Construct a not-yet-allocated store. Call [`Self::init`] before use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: RwLock::new(None),
        }
    }

    /// Allocate the backing store.
    pub async fn init(&self) {
        let mut table = self.table.write().await;
        if table.is_none() {
            *table = Some(Table {
                rows: Vec::new(),
                index: HashMap::new(),
            });
        }
    }

    /// Upsert a row keyed by `uri`. Re-indexing an existing URI overwrites
    /// its prior payload in place (idempotent).
    pub async fn add(
        &self,
        uri: impl Into<String>,
        text: &str,
        embedding: Vec<f32>,
        kind: IndexedKind,
        now_millis: i64,
    ) -> Result<(), VectorStoreError> {
        let uri = uri.into();
        let mut guard = self.table.write().await;
        let table = guard.as_mut().ok_or(VectorStoreError::NotReady)?;

        let full_text_length = text.len();
        let text_preview: String = text.chars().take(TEXT_PREVIEW_LIMIT).collect();
        let row = Row {
            uri: uri.clone(),
            blob: encode_blob(&embedding),
            text_preview,
            full_text_length,
            indexed_at: now_millis,
            embedding_dim: embedding.len(),
            kind,
        };

        if let Some(&pos) = table.index.get(&uri) {
            table.rows[pos] = row;
        } else {
            table.index.insert(uri, table.rows.len());
            table.rows.push(row);
        }
        Ok(())
    }

    /// Cosine top-K search via dot product (vectors are assumed
    /// L2-normalized by the caller). Rows with mismatched dimension, or a
    /// corrupt blob, are skipped with a warning rather than aborting.
    pub async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let guard = self.table.read().await;
        let table = guard.as_ref().ok_or(VectorStoreError::NotReady)?;

        let mut hits: Vec<SearchHit> = Vec::new();
        for row in &table.rows {
            let (blob, preview, dim, indexed_at, full_len, kind) = row.columns();
            let Some(vector) = decode_blob(blob) else {
                warn!(uri = %row.uri, "skipping corrupt vector store row: bad blob length");
                continue;
            };
            if vector.len() != query_embedding.len() || dim != query_embedding.len() {
                warn!(
                    uri = %row.uri,
                    stored_dim = dim,
                    query_dim = query_embedding.len(),
                    "skipping vector store row: dimension mismatch"
                );
                continue;
            }
            let score: f32 = vector
                .iter()
                .zip(query_embedding.iter())
                .map(|(a, b)| a * b)
                .sum();
            if score < min_score {
                continue;
            }
            hits.push(SearchHit {
                uri: row.uri.clone(),
                score,
                text: preview.to_string(),
                metadata: IndexedMetadata {
                    text_preview: preview.to_string(),
                    full_text_length: full_len,
                    indexed_at,
                    embedding_dim: dim,
                    kind,
                },
            });
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    /// All stored URIs, in insertion order (ties in `search` order by score,
    /// not this order).
    pub async fn all_uris(&self) -> Result<Vec<String>, VectorStoreError> {
        let guard = self.table.read().await;
        let table = guard.as_ref().ok_or(VectorStoreError::NotReady)?;
        Ok(table.rows.iter().map(|r| r.uri.clone()).collect())
    }

    /// Drop all rows, keeping the store allocated and ready.
    pub async fn clear(&self) {
        let mut guard = self.table.write().await;
        if let Some(table) = guard.as_mut() {
            table.rows.clear();
            table.index.clear();
        }
    }

    /// Row count and approximate blob storage size.
    pub async fn stats(&self) -> VectorStoreStats {
        let guard = self.table.read().await;
        match guard.as_ref() {
            Some(table) => VectorStoreStats {
                count: table.rows.len(),
                total_bytes: table.rows.iter().map(|r| r.blob.len()).sum(),
            },
            None => VectorStoreStats {
                count: 0,
                total_bytes: 0,
            },
        }
    }
}

impl Default for VectorStore {
    fn default() -> Self {
        Self::new()
    }
}
