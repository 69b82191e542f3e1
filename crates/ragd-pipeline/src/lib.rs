//! ragd-pipeline - Retrieval pipeline
//!
//! This crate orchestrates ingestion (split, embed, index), similarity
//! search, and bounded-prompt answer generation over the vector index and the
//! generative capability.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragd_pipeline::RetrievalPipeline;
//! use std::sync::Arc;
//!
//! let pipeline = RetrievalPipeline::new(index, generator, &config);
//! let report = pipeline.add_documents(&texts, None, None).await;
//! let hits = pipeline.search("error handling", 4).await?;
//! ```

mod pipeline;
mod splitter;

pub use pipeline::RetrievalPipeline;
pub use splitter::{split_text, SplitConfig};

// Re-export for convenience
pub use ragd_core::{IngestReport, RagAnswer, SearchHit, SearchHits};
