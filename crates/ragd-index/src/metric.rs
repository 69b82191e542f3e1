//! Similarity metrics.

use std::str::FromStr;

use ragd_core::RagError;

/// Similarity metric for a vector index.
///
/// Fixed per index instance at construction and never changed afterwards:
/// score comparability across calls depends on it. Both variants report
/// higher-is-better similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Cosine similarity; normalizes both vectors, range [-1, 1].
    Cosine,

    /// Raw inner product. Equivalent to cosine when the embedder
    /// L2-normalizes its output.
    DotProduct,
}

impl Metric {
    /// Score two vectors. Mismatched dimensions score 0.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();

        match self {
            Self::DotProduct => dot,
            Self::Cosine => {
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    0.0
                } else {
                    dot / (norm_a * norm_b)
                }
            }
        }
    }

    /// Best possible score for this metric, used by round-trip tests.
    pub fn best_score(&self) -> f32 {
        1.0
    }
}

impl FromStr for Metric {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cosine" => Ok(Self::Cosine),
            "dot" | "dot_product" | "inner_product" => Ok(Self::DotProduct),
            other => Err(RagError::Config {
                message: format!("unknown metric '{}' (expected cosine or dot_product)", other),
            }),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::DotProduct => write!(f, "dot_product"),
        }
    }
}
