//! Tool registry.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use ragd_core::{RagError, Result};

use crate::schema::InputSchema;

/// Tool metadata published via `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: InputSchema,
}

/// A failed tool invocation.
///
/// Carries an optional structured payload for the JSON-RPC `error.data`
/// field (e.g. retrieval sources when only generation failed).
#[derive(Debug)]
pub struct ToolFailure {
    pub error: RagError,
    pub data: Option<Value>,
}

impl From<RagError> for ToolFailure {
    fn from(error: RagError) -> Self {
        Self { error, data: None }
    }
}

/// Outcome of a tool invocation.
pub type ToolResult = std::result::Result<Value, ToolFailure>;

/// Async tool handler over already-validated arguments.
pub type ToolHandler =
    Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> + Send + Sync>;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: ToolHandler,
}

/// Registry mapping tool names to schema-validated handlers.
///
/// The tool set is fixed at startup; descriptors are listed in registration
/// order. No failure escapes `invoke`: schema violations are rejected before
/// the handler runs, handler errors become structured failures, and handler
/// panics are contained by running the handler on its own task.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; names must be unique.
    pub fn register(&mut self, descriptor: ToolDescriptor, handler: ToolHandler) -> Result<()> {
        if self.by_name.contains_key(&descriptor.name) {
            return Err(RagError::DuplicateTool {
                name: descriptor.name.clone(),
            });
        }

        debug!(tool = %descriptor.name, "Registered tool");
        self.by_name.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool { descriptor, handler });
        Ok(())
    }

    /// All descriptors in registration order.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate arguments and invoke the named tool.
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolResult {
        let tool = match self.by_name.get(name) {
            Some(&idx) => &self.tools[idx],
            None => {
                return Err(RagError::ToolNotFound {
                    name: name.to_string(),
                }
                .into())
            }
        };

        if let Err(violations) = tool.descriptor.input_schema.validate(&arguments) {
            return Err(RagError::validation(name, violations.join("; ")).into());
        }

        // Run on a separate task so a panicking handler cannot take the
        // session down with it.
        let future = (tool.handler)(arguments);
        match tokio::spawn(future).await {
            Ok(result) => result,
            Err(join_err) => {
                error!(tool = name, "Tool handler aborted: {}", join_err);
                Err(RagError::internal(format!("tool '{}' aborted", name)).into())
            }
        }
    }
}
