//! Per-session message dispatch.
//!
//! Each connection gets one [`Session`] running on its own task. Messages
//! from a session are processed strictly in arrival order; a message is
//! fully handled and its response framed before the next one is read.
//! Sessions are independent of each other and share only the dispatcher.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use ulid::Ulid;

use ragd_core::RagError;

use crate::envelope::{ProtocolMethod, RequestEnvelope, RequestId, ResponseEnvelope};
use crate::registry::ToolRegistry;
use crate::sse::SseEvent;

/// Protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Lifecycle of a session's message loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next inbound message.
    Idle,
    /// Decoding raw bytes into a request envelope.
    Parsing,
    /// Resolving the protocol method and tool name.
    Dispatching,
    /// Running a tool handler.
    Executing,
    /// Framing and sending the response.
    Responding,
    /// Transport gone; the session will not process further messages.
    Closed,
}

/// What the dispatcher decided to do with a decoded request.
enum Resolved {
    /// Answer immediately; no tool handler involved.
    Reply(ResponseEnvelope),
    /// Invoke a registered tool.
    Call {
        id: Option<RequestId>,
        name: String,
        arguments: Value,
    },
}

/// Stateless request handler shared by all sessions.
///
/// Holds the tool registry and server identity; everything per-session
/// lives in [`Session`]. Request handling is staged so the session loop can
/// track each phase: decode, resolve, execute.
pub struct SessionDispatcher {
    registry: Arc<ToolRegistry>,
    server_name: String,
    server_version: String,
}

impl SessionDispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        server_name: impl Into<String>,
        server_version: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            server_name: server_name.into(),
            server_version: server_version.into(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw inbound message through all stages.
    ///
    /// Returns `None` when no response is owed (notifications). Every other
    /// outcome, including parse failures, produces a response envelope; no
    /// input can error the session itself.
    pub async fn handle_message(&self, raw: &[u8]) -> Option<ResponseEnvelope> {
        let envelope = match self.decode(raw) {
            Ok(envelope) => envelope,
            Err(response) => return Some(response),
        };

        let is_notification = envelope.id.is_none();
        let response = match self.resolve(envelope) {
            Resolved::Reply(response) => response,
            Resolved::Call { id, name, arguments } => self.execute(id, &name, arguments).await,
        };

        if is_notification {
            // Notifications are never answered, not even on failure.
            None
        } else {
            Some(response)
        }
    }

    /// Decode raw bytes into a request envelope.
    ///
    /// Failures come back as ready-made responses: `-32700` for invalid
    /// JSON, `-32600` for a structurally invalid envelope.
    fn decode(&self, raw: &[u8]) -> Result<RequestEnvelope, ResponseEnvelope> {
        let value: Value = match serde_json::from_slice(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("Rejected unparseable message: {}", e);
                return Err(ResponseEnvelope::parse_error(e.to_string()));
            }
        };

        RequestEnvelope::from_value(&value).map_err(|e| {
            // Envelope is malformed but the id may still be recoverable.
            warn!("Rejected invalid request: {}", e);
            ResponseEnvelope::from_error(extract_id(&value), &e, None)
        })
    }

    /// Resolve the protocol method and, for `tools/call`, the tool call.
    ///
    /// Everything except a valid tool invocation is answered here without
    /// touching the registry.
    fn resolve(&self, envelope: RequestEnvelope) -> Resolved {
        let id = envelope.id.clone();

        let method = match ProtocolMethod::parse(&envelope.method) {
            Some(m) => m,
            None => {
                debug!(method = %envelope.method, "Unknown method");
                let err = RagError::MethodNotFound {
                    method: envelope.method,
                };
                return Resolved::Reply(ResponseEnvelope::from_error(id, &err, None));
            }
        };

        match method {
            ProtocolMethod::Initialize => Resolved::Reply(reply(id, self.initialize_result())),
            ProtocolMethod::Ping => Resolved::Reply(reply(id, json!({}))),
            ProtocolMethod::ToolsList => Resolved::Reply(reply(id, self.tools_list_result())),
            ProtocolMethod::Notification => Resolved::Reply(reply(id, Value::Null)),
            ProtocolMethod::ToolsCall => {
                let name = match envelope.params.get("name").and_then(Value::as_str) {
                    Some(name) => name.to_string(),
                    None => {
                        let err = RagError::invalid_params("tools/call requires a string 'name'");
                        return Resolved::Reply(ResponseEnvelope::from_error(id, &err, None));
                    }
                };

                let arguments = match envelope.params.get("arguments") {
                    None | Some(Value::Null) => Value::Object(Default::default()),
                    Some(v) if v.is_object() => v.clone(),
                    Some(_) => {
                        let err = RagError::invalid_params("'arguments' must be an object");
                        return Resolved::Reply(ResponseEnvelope::from_error(id, &err, None));
                    }
                };

                Resolved::Call { id, name, arguments }
            }
        }
    }

    /// Run a resolved tool call to a response envelope.
    async fn execute(
        &self,
        id: Option<RequestId>,
        name: &str,
        arguments: Value,
    ) -> ResponseEnvelope {
        debug!(tool = name, "Invoking tool");
        match self.registry.invoke(name, arguments).await {
            Ok(result) => reply(id, result),
            Err(failure) => {
                warn!(tool = name, "Tool failed: {}", failure.error);
                ResponseEnvelope::from_error(id, &failure.error, failure.data)
            }
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": self.server_name,
                "version": self.server_version,
            },
        })
    }

    fn tools_list_result(&self) -> Value {
        json!({ "tools": self.registry.descriptors() })
    }
}

/// Successful response for a resolved request.
///
/// A missing id marks a notification; its reply is still built and then
/// dropped by the caller, so the placeholder id never reaches the wire.
fn reply(id: Option<RequestId>, result: Value) -> ResponseEnvelope {
    ResponseEnvelope::success(id.unwrap_or(RequestId::Num(0)), result)
}

/// One client connection's message loop.
pub struct Session {
    id: Ulid,
    dispatcher: Arc<SessionDispatcher>,
    state: SessionState,
}

impl Session {
    pub fn new(dispatcher: Arc<SessionDispatcher>) -> Self {
        Self {
            id: Ulid::new(),
            dispatcher,
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn set_state(&mut self, state: SessionState) {
        trace!(session = %self.id, ?state, "Session state");
        self.state = state;
    }

    /// Drain `inbound` in arrival order, writing SSE-framed responses to
    /// `outbound`. Returns when the transport closes either channel.
    ///
    /// Each message walks the state machine: `Parsing` while the envelope is
    /// decoded, `Dispatching` while the method and tool name are resolved,
    /// `Executing` only when a tool handler actually runs, `Responding` while
    /// the response is framed and sent, then back to `Idle`.
    pub async fn run(
        mut self,
        mut inbound: mpsc::Receiver<Vec<u8>>,
        outbound: mpsc::Sender<Vec<u8>>,
    ) {
        info!(session = %self.id, "Session started");

        while let Some(raw) = inbound.recv().await {
            self.set_state(SessionState::Parsing);
            let response = match self.dispatcher.decode(&raw) {
                // Parse-level failures go straight to the responding phase.
                Err(response) => Some(response),
                Ok(envelope) => {
                    let is_notification = envelope.id.is_none();

                    self.set_state(SessionState::Dispatching);
                    let response = match self.dispatcher.resolve(envelope) {
                        Resolved::Reply(response) => response,
                        Resolved::Call { id, name, arguments } => {
                            self.set_state(SessionState::Executing);
                            self.dispatcher.execute(id, &name, arguments).await
                        }
                    };

                    if is_notification {
                        None
                    } else {
                        Some(response)
                    }
                }
            };

            if let Some(response) = response {
                self.set_state(SessionState::Responding);
                let payload = match serde_json::to_value(&response) {
                    Ok(v) => v,
                    Err(e) => {
                        // Response types always serialize; treat anything
                        // else as an internal fault on this one message.
                        warn!(session = %self.id, "Response serialization failed: {}", e);
                        self.set_state(SessionState::Idle);
                        continue;
                    }
                };
                let frame = SseEvent::message(&payload);
                if outbound.send(frame.into_bytes()).await.is_err() {
                    // Receiver dropped mid-response; the result is discarded.
                    self.set_state(SessionState::Closed);
                    info!(session = %self.id, "Session closed (outbound gone)");
                    return;
                }
            }
            self.set_state(SessionState::Idle);
        }

        self.set_state(SessionState::Closed);
        info!(session = %self.id, "Session closed");
    }
}

/// Spawn a session task, returning its inbound sender and outbound receiver.
///
/// The transport feeds raw message bytes into the sender and forwards SSE
/// frames from the receiver; dropping the sender ends the session.
pub fn spawn_session(
    dispatcher: Arc<SessionDispatcher>,
) -> (mpsc::Sender<Vec<u8>>, mpsc::Receiver<Vec<u8>>) {
    let (in_tx, in_rx) = mpsc::channel(32);
    let (out_tx, out_rx) = mpsc::channel(32);

    let session = Session::new(dispatcher);
    tokio::spawn(session.run(in_rx, out_tx));

    (in_tx, out_rx)
}

fn extract_id(value: &Value) -> Option<RequestId> {
    match value.get("id") {
        Some(Value::Number(n)) => n.as_i64().map(RequestId::Num),
        Some(Value::String(s)) => Some(RequestId::Str(s.clone())),
        _ => None,
    }
}
