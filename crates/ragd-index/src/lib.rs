//! ragd-index - In-memory vector index
//!
//! This crate provides a brute-force linear-scan similarity index over an
//! embedding capability. Adequate for small corpora; an approximate index can
//! replace it behind the same surface as long as top-k ordering is preserved.
//!
//! Scores are higher-is-better for every supported metric. Ties are broken by
//! insertion order (first-ingested wins).

mod memory;
mod metric;

pub use memory::{Ingested, VectorIndex};
pub use metric::Metric;
