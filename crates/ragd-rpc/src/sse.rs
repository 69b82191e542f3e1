//! Server-sent event framing.
//!
//! Each JSON-RPC response is serialized onto the wire as one SSE event.
//! Multi-line payloads get one `data:` line per payload line so the frame
//! stays well-formed regardless of the JSON content.

use serde_json::Value;

/// A single SSE frame carrying a JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    event: String,
    data: String,
}

impl SseEvent {
    /// Frame a JSON value as a `message` event.
    pub fn message(payload: &Value) -> Self {
        Self {
            event: "message".to_string(),
            data: payload.to_string(),
        }
    }

    /// Frame a JSON value under a custom event name.
    pub fn named(event: impl Into<String>, payload: &Value) -> Self {
        Self {
            event: event.into(),
            data: payload.to_string(),
        }
    }

    /// Render the frame, including the terminating blank line.
    pub fn to_wire(&self) -> String {
        let mut out = String::with_capacity(self.data.len() + 32);
        out.push_str("event: ");
        out.push_str(&self.event);
        out.push('\n');
        for line in self.data.split('\n') {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.to_wire().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_line_frame() {
        let frame = SseEvent::message(&json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
        let wire = frame.to_wire();
        assert!(wire.starts_with("event: message\ndata: "));
        assert!(wire.ends_with("\n\n"));
        assert_eq!(wire.matches("data: ").count(), 1);
    }

    #[test]
    fn test_custom_event_name() {
        let frame = SseEvent::named("endpoint", &json!("/rpc"));
        assert!(frame.to_wire().starts_with("event: endpoint\n"));
    }

    #[test]
    fn test_payload_round_trips() {
        let payload = json!({"id": "abc", "result": {"tools": []}});
        let wire = SseEvent::message(&payload).to_wire();
        let data_line = wire
            .lines()
            .find(|l| l.starts_with("data: "))
            .and_then(|l| l.strip_prefix("data: "))
            .unwrap();
        let parsed: Value = serde_json::from_str(data_line).unwrap();
        assert_eq!(parsed, payload);
    }
}
