//! ragd-rpc - JSON-RPC session layer and tool registry
//!
//! This crate implements the protocol/dispatch core of ragd: JSON-RPC 2.0
//! envelopes, an exhaustive protocol-method match, a schema-validating tool
//! registry, per-session serialized dispatch, and SSE response framing.
//!
//! # Protocol methods
//!
//! - `initialize` - handshake, reports server info and capabilities
//! - `ping` - liveness check
//! - `tools/list` - discoverable tool manifest
//! - `tools/call` - invoke a registered tool
//! - `notifications/*` - accepted, never answered
//!
//! All failures become JSON-RPC error objects; nothing short of transport
//! teardown closes a session.

mod dispatch;
mod envelope;
mod registry;
mod schema;
mod sse;
mod tools;

pub use dispatch::{spawn_session, Session, SessionDispatcher, SessionState, PROTOCOL_VERSION};
pub use envelope::{ProtocolMethod, RequestEnvelope, RequestId, ResponseEnvelope, RpcError};
pub use registry::{ToolDescriptor, ToolFailure, ToolHandler, ToolRegistry, ToolResult};
pub use schema::{InputSchema, PropKind, PropSchema};
pub use sse::SseEvent;
pub use tools::register_builtin_tools;
