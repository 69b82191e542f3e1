//! Capability traits consumed by the retrieval core.
//!
//! The embedding and generative model backends are external collaborators;
//! the core only ever talks to them through these traits.

use async_trait::async_trait;

use crate::error::Result;

/// Embedding capability.
///
/// Implementations must be deterministic for a given input within one process
/// lifetime, since score comparability across queries depends on it.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of document texts.
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;
}

/// Generative capability.
///
/// `complete` may suspend on network I/O; callers must not hold index locks
/// across it.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete a prompt into an answer.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Maximum prompt size in characters the backend accepts.
    ///
    /// The pipeline truncates retrieved context to fit this budget, dropping
    /// lowest-ranked documents first and never the query.
    fn max_prompt_chars(&self) -> usize;
}
