//! Error types for the ragd tool server.

use thiserror::Error;

/// Result type alias using RagError.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors that can occur in the ragd system.
#[derive(Error, Debug)]
pub enum RagError {
    /// Malformed request envelope.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Unknown protocol method.
    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    /// Structurally invalid method params.
    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    /// Tool arguments failed schema validation.
    #[error("Validation failed for tool '{tool}': {message}")]
    Validation { tool: String, message: String },

    /// Unknown tool name.
    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    /// Tool already registered under this name.
    #[error("Tool already registered: {name}")]
    DuplicateTool { name: String },

    /// Invalid argument provided to a domain operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Embedding capability failure.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// Generative capability failure.
    #[error("Generation error: {message}")]
    Generation { message: String },

    /// The index holds no documents but at least one result was required.
    #[error("Index is empty")]
    EmptyIndex,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RagError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Create a validation error for a named tool.
    pub fn validation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// JSON-RPC error code for this error.
    ///
    /// Protocol-level failures use the reserved -326xx codes; capability and
    /// retrieval failures use server-defined codes in the -320xx range.
    pub fn rpc_code(&self) -> i64 {
        match self {
            Self::InvalidRequest { .. } => -32600,
            Self::MethodNotFound { .. } => -32601,
            Self::InvalidParams { .. }
            | Self::Validation { .. }
            | Self::ToolNotFound { .. }
            | Self::DuplicateTool { .. }
            | Self::InvalidArgument { .. } => -32602,
            Self::Embedding { .. } | Self::Generation { .. } => -32002,
            Self::EmptyIndex => -32001,
            Self::Io(_)
            | Self::Serialization(_)
            | Self::Config { .. }
            | Self::Internal { .. } => -32603,
        }
    }

    /// Whether the message is safe to surface verbatim to clients.
    ///
    /// Internal failures are reported generically so handler bugs cannot leak
    /// implementation detail over the wire.
    pub fn is_public(&self) -> bool {
        !matches!(
            self,
            Self::Io(_) | Self::Serialization(_) | Self::Config { .. } | Self::Internal { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RagError::ToolNotFound {
            name: "bogus_tool".to_string(),
        };
        assert!(err.to_string().contains("bogus_tool"));
    }

    #[test]
    fn test_rpc_codes() {
        assert_eq!(
            RagError::MethodNotFound {
                method: "x".to_string()
            }
            .rpc_code(),
            -32601
        );
        assert_eq!(RagError::invalid_params("missing name").rpc_code(), -32602);
        assert_eq!(RagError::validation("t", "bad").rpc_code(), -32602);
        assert_eq!(RagError::generation("down").rpc_code(), -32002);
        assert_eq!(RagError::internal("oops").rpc_code(), -32603);
    }

    #[test]
    fn test_internal_errors_are_not_public() {
        assert!(!RagError::internal("secret detail").is_public());
        assert!(RagError::invalid_argument("empty query").is_public());
    }
}
