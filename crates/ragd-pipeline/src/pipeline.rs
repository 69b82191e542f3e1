//! Retrieval pipeline orchestration.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use ragd_core::{
    Generator, HealthStatus, IngestFailure, IngestReport, RagAnswer, RagError, RagdConfig, Result,
    SearchHits,
};
use ragd_index::VectorIndex;

use crate::splitter::{split_text, SplitConfig};

/// Orchestrates ingestion, similarity search, and answer generation.
///
/// Owns no state of its own; the index is shared across all sessions and the
/// generator is only reached through its trait, so every suspension point is
/// a capability call with no index lock held.
pub struct RetrievalPipeline {
    index: Arc<VectorIndex>,
    generator: Arc<dyn Generator>,
    chunking: SplitConfig,
}

impl RetrievalPipeline {
    /// Create a pipeline over a shared index and generative capability.
    pub fn new(index: Arc<VectorIndex>, generator: Arc<dyn Generator>, config: &RagdConfig) -> Self {
        Self {
            index,
            generator,
            chunking: SplitConfig {
                chunk_size: config.chunking.chunk_size,
                chunk_overlap: config.chunking.chunk_overlap,
            },
        }
    }

    /// The shared vector index.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Split and ingest a batch of texts.
    ///
    /// Each text is processed independently: a failing text is reported in
    /// the result and never aborts its siblings, and chunks already committed
    /// stay committed (batch ingestion is not atomic).
    pub async fn add_documents(
        &self,
        texts: &[String],
        metadatas: Option<&[HashMap<String, serde_json::Value>]>,
        chunking: Option<SplitConfig>,
    ) -> IngestReport {
        let chunking = chunking.unwrap_or_else(|| self.chunking.clone());
        let mut report = IngestReport::default();

        for (i, text) in texts.iter().enumerate() {
            let chunks = split_text(text, &chunking);
            if chunks.is_empty() {
                report.failed.push(IngestFailure {
                    index: i,
                    error: "text is empty".to_string(),
                });
                continue;
            }

            let base_metadata = metadatas
                .and_then(|m| m.get(i))
                .cloned()
                .unwrap_or_default();
            let total_chunks = chunks.len();

            for (j, chunk) in chunks.into_iter().enumerate() {
                let mut metadata = base_metadata.clone();
                metadata.insert("chunk_index".to_string(), serde_json::json!(j));
                metadata.insert("total_chunks".to_string(), serde_json::json!(total_chunks));

                match self.index.ingest(&chunk, metadata).await {
                    Ok(outcome) if outcome.deduplicated => {
                        report.deduplicated += 1;
                    }
                    Ok(outcome) => {
                        report.added += 1;
                        report.ids.push(outcome.document.id);
                    }
                    Err(e) => {
                        warn!(text_index = i, chunk = j, "Ingest failed: {}", e);
                        report.failed.push(IngestFailure {
                            index: i,
                            error: e.to_string(),
                        });
                        // Remaining chunks of this text are skipped; other
                        // texts still proceed.
                        break;
                    }
                }
            }
        }

        info!(
            added = report.added,
            failed = report.failed.len(),
            "Ingested batch of {} texts",
            texts.len()
        );
        report
    }

    /// Similarity search over the index.
    ///
    /// Rejects empty queries. `k` greater than the corpus size returns the
    /// full corpus.
    pub async fn search(&self, query: &str, k: usize) -> Result<SearchHits> {
        if query.trim().is_empty() {
            return Err(RagError::invalid_argument("query must not be empty"));
        }

        self.index.query(query, k).await
    }

    /// Retrieve context and generate an answer.
    ///
    /// Fails with `EmptyIndex` when retrieval finds nothing to condition on,
    /// and with `Generation` when the generative capability rejects the
    /// prompt. Callers that need the sources on generation failure should use
    /// [`search`](Self::search) followed by
    /// [`generate_from`](Self::generate_from).
    pub async fn generate_answer(&self, query: &str, k: usize) -> Result<RagAnswer> {
        let sources = self.search(query, k).await?;
        if sources.hits.is_empty() {
            return Err(RagError::EmptyIndex);
        }

        let answer = self.generate_from(query, &sources).await?;
        Ok(RagAnswer { answer, sources })
    }

    /// Generate an answer from already-retrieved sources.
    pub async fn generate_from(&self, query: &str, sources: &SearchHits) -> Result<String> {
        let prompt = build_prompt(query, sources, self.generator.max_prompt_chars());
        debug!(prompt_chars = prompt.chars().count(), "Generating answer");
        self.generator.complete(&prompt).await
    }

    /// Health-check payload backed by the index count.
    pub async fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            document_count: self.index.count().await,
        }
    }
}

const PROMPT_HEADER: &str =
    "Please answer the question based on the following documents.\n\nReference Documents:\n";
const PROMPT_FOOTER: &str =
    "\nPlease provide an accurate and detailed answer based on the information above.\n";

/// Assemble a generation prompt within the model's input budget.
///
/// The budget is measured in characters, matching the splitter. Documents are
/// added in rank order; when the budget runs out the remaining (lower-ranked)
/// documents are dropped. The query is never dropped.
pub fn build_prompt(query: &str, sources: &SearchHits, max_chars: usize) -> String {
    let char_len = |s: &str| s.chars().count();

    let question = format!("\nQuestion: {}\n", query);
    let scaffold_len = char_len(PROMPT_HEADER) + char_len(&question) + char_len(PROMPT_FOOTER);

    let mut context = String::new();
    let mut context_len = 0;
    for hit in &sources.hits {
        let block = format!("[Document {}]\n{}\n\n", hit.rank, hit.document.text);
        if scaffold_len + context_len + char_len(&block) > max_chars {
            debug!(
                rank = hit.rank,
                "Prompt budget reached, dropping remaining documents"
            );
            break;
        }
        context_len += char_len(&block);
        context.push_str(&block);
    }

    format!("{}{}{}{}", PROMPT_HEADER, context, question, PROMPT_FOOTER)
}
