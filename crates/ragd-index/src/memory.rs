//! In-memory brute-force vector index.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, info};
use ulid::Ulid;

use ragd_core::{Document, Embedder, Result, SearchHit, SearchHits};

use crate::metric::Metric;

/// Outcome of an ingest: the stored document plus whether it was already
/// present (content-hash duplicate).
#[derive(Debug, Clone)]
pub struct Ingested {
    pub document: Document,
    pub deduplicated: bool,
}

/// Shared in-memory vector index.
///
/// Embedding computation happens outside the lock, so the index never blocks
/// readers while a capability call is suspended. Ingests serialize on a short
/// write lock (consistent id assignment and count); queries take a read lock
/// and see every ingest that completed before the scan began. A document
/// becomes visible only after `ingest` returns.
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    metric: Metric,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    docs: Vec<Document>,
    by_hash: HashMap<[u8; 32], Ulid>,
}

impl VectorIndex {
    /// Create an empty index over the given embedder and metric.
    pub fn new(embedder: Arc<dyn Embedder>, metric: Metric) -> Self {
        Self {
            embedder,
            metric,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// The similarity metric this index was built with.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Embedding dimension of the backing capability.
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Embed and store a document, returning it with its assigned id.
    ///
    /// Ingesting text whose content hash is already present returns the
    /// existing document flagged as deduplicated instead of storing a
    /// duplicate, so callers can report it separately from new documents.
    pub async fn ingest(
        &self,
        text: &str,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<Ingested> {
        let embedding = self.embedder.embed_query(text).await?;

        let mut inner = self.inner.write().await;

        let hash = ragd_core::content_hash(text);
        if let Some(existing_id) = inner.by_hash.get(&hash) {
            let existing_id = *existing_id;
            if let Some(doc) = inner.docs.iter().find(|d| d.id == existing_id) {
                debug!(id = %doc.id, "Duplicate content, returning existing document");
                return Ok(Ingested {
                    document: doc.clone(),
                    deduplicated: true,
                });
            }
        }

        let doc = Document::new(text, metadata, embedding);
        inner.by_hash.insert(hash, doc.id);
        inner.docs.push(doc.clone());

        debug!(id = %doc.id, count = inner.docs.len(), "Ingested document");
        Ok(Ingested {
            document: doc,
            deduplicated: false,
        })
    }

    /// Embed the query text and return the top `k` most similar documents.
    ///
    /// `k = 0` yields an empty result; `k` greater than the corpus size
    /// returns the full corpus. An empty index yields an empty result; the
    /// policy of requiring at least one document belongs to the caller.
    pub async fn query(&self, text: &str, k: usize) -> Result<SearchHits> {
        let start = Instant::now();

        if k == 0 {
            return Ok(SearchHits {
                query: text.to_string(),
                total: 0,
                latency_ms: start.elapsed().as_millis() as u64,
                hits: Vec::new(),
            });
        }

        let query_embedding = self.embedder.embed_query(text).await?;

        let inner = self.inner.read().await;

        // Stable sort keeps insertion order for equal scores.
        let mut scored: Vec<(usize, f32)> = inner
            .docs
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, self.metric.score(&query_embedding, &doc.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        let hits: Vec<SearchHit> = scored
            .into_iter()
            .enumerate()
            .map(|(rank, (i, score))| SearchHit {
                rank: rank as u32 + 1,
                score,
                document: inner.docs[i].clone(),
            })
            .collect();

        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(
            total = hits.len(),
            latency_ms, "Query scanned {} documents", inner.docs.len()
        );

        Ok(SearchHits {
            query: text.to_string(),
            total: hits.len(),
            latency_ms,
            hits,
        })
    }

    /// Current document count.
    pub async fn count(&self) -> usize {
        self.inner.read().await.docs.len()
    }

    /// Remove every document, returning how many were removed.
    pub async fn clear(&self) -> usize {
        let mut inner = self.inner.write().await;
        let removed = inner.docs.len();
        inner.docs.clear();
        inner.by_hash.clear();
        info!(removed, "Cleared index");
        removed
    }
}
