//! Configuration types for the ragd tool server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for ragd.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagdConfig {
    /// Index configuration.
    #[serde(default)]
    pub index: IndexConfig,

    /// Chunking configuration.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Search configuration.
    #[serde(default)]
    pub search: SearchConfig,

    /// Generation configuration.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Vector index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Similarity metric, fixed for the lifetime of the index.
    #[serde(default = "default_metric")]
    pub metric: String,

    /// Embedding dimension.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            metric: default_metric(),
            dimension: default_dimension(),
        }
    }
}

/// Chunking configuration for document ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Character overlap between adjacent chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of results.
    #[serde(default = "default_k")]
    pub default_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_k: 4 }
    }
}

/// Answer generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Number of documents retrieved for answer generation.
    #[serde(default = "default_k")]
    pub context_k: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            context_k: default_k(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server name reported in the initialize handshake.
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Bind address for network transports.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            bind_address: default_bind_address(),
        }
    }
}

// Default value functions

fn default_metric() -> String {
    "cosine".to_string()
}

fn default_dimension() -> usize {
    384
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_k() -> usize {
    4
}

fn default_server_name() -> String {
    "ragd".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

impl RagdConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::error::RagError::Config {
            message: format!("Failed to parse config: {}", e),
        })?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> crate::error::Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ragd").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("ragd.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        // Return defaults
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RagdConfig::default();
        assert_eq!(config.index.metric, "cosine");
        assert_eq!(config.search.default_k, 4);
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
    }

    #[test]
    fn test_load_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chunking]\nchunk_size = 500").unwrap();

        let config = RagdConfig::load(file.path()).unwrap();
        assert_eq!(config.chunking.chunk_size, 500);
        // Unset fields fall back to defaults
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.index.metric, "cosine");
    }

    #[test]
    fn test_load_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();

        let err = RagdConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, crate::error::RagError::Config { .. }));
    }
}
