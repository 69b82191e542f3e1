//! ragd-embed - Capability adapters for ragd
//!
//! This crate provides in-process implementations of the embedding and
//! generation capabilities the retrieval core consumes through traits.
//!
//! # Features
//!
//! - `HashEmbedder`: deterministic token-feature-hash embeddings with
//!   L2 normalization, usable without any model runtime
//! - `ExtractiveGenerator`: offline answer composition from retrieved context
//!
//! Real model backends (ONNX embedders, hosted LLM APIs) plug in behind the
//! same `Embedder` / `Generator` traits.

mod extractive;
mod hash;

pub use extractive::ExtractiveGenerator;
pub use hash::HashEmbedder;

// Re-export the capability traits for convenience
pub use ragd_core::{Embedder, Generator};
