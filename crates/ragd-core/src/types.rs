//! Core domain types for the ragd tool server.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ulid::Ulid;

/// A document stored in the vector index.
///
/// Immutable once ingested: the embedding is computed during ingestion and
/// never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (ULID), assigned by the index.
    pub id: Ulid,

    /// Document text.
    pub text: String,

    /// User-provided metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// Embedding vector, computed at ingest time.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,

    /// Blake3 hash of the text, used for ingest deduplication.
    #[serde(with = "serde_hash")]
    pub content_hash: [u8; 32],

    /// Creation timestamp (Unix millis).
    pub created_at: u64,
}

impl Document {
    /// Create a new document with a fresh id and content hash.
    pub fn new(
        text: &str,
        metadata: HashMap<String, serde_json::Value>,
        embedding: Vec<f32>,
    ) -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            id: Ulid::new(),
            text: text.to_string(),
            metadata,
            embedding,
            content_hash: *blake3::hash(text.as_bytes()).as_bytes(),
            created_at: now,
        }
    }
}

/// Blake3 content hash used for ingest deduplication.
pub fn content_hash(text: &str) -> [u8; 32] {
    *blake3::hash(text.as_bytes()).as_bytes()
}

/// A single search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result rank (1-indexed, 1 = most similar).
    pub rank: u32,

    /// Similarity score (higher is better for all supported metrics).
    pub score: f32,

    /// The matched document.
    pub document: Document,
}

/// Search results container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHits {
    /// The original query.
    pub query: String,

    /// Total results returned.
    pub total: usize,

    /// Search latency in milliseconds.
    pub latency_ms: u64,

    /// Individual hits, sorted by similarity descending.
    pub hits: Vec<SearchHit>,
}

/// Per-item outcome report for a batch ingest.
///
/// A failing text never aborts its siblings; committed chunks stay committed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Number of new document chunks committed to the index.
    pub added: usize,

    /// Number of chunks skipped because their content was already indexed.
    /// `added` always matches the actual index growth.
    pub deduplicated: usize,

    /// Ids of the newly committed chunks, in ingestion order.
    pub ids: Vec<Ulid>,

    /// Failures keyed by the index of the input text that produced them.
    pub failed: Vec<IngestFailure>,
}

/// A single failed input in a batch ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestFailure {
    /// Index of the input text within the request batch.
    pub index: usize,

    /// Human-readable failure reason.
    pub error: String,
}

/// Generated answer with its supporting retrieval results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    /// The generated answer text.
    pub answer: String,

    /// Documents the answer was conditioned on.
    pub sources: SearchHits,
}

/// Health-check payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall status, `"ok"` when the index is reachable.
    pub status: String,

    /// Current document count.
    pub document_count: usize,
}

/// Helper module for hex serialization of content hashes.
mod serde_hash {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        hex::encode(value).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        let bytes = hex::decode(&hex_str).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("invalid hash length"))
    }
}
