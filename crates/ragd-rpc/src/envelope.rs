//! JSON-RPC 2.0 envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ragd_core::{RagError, Result};

/// Client-supplied request id, echoed back type-preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Num(i64),
    Str(String),
}

/// Recognized protocol methods.
///
/// The protocol layer matches exhaustively on this enum; only the tool layer
/// is an open, extensible mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolMethod {
    Initialize,
    Ping,
    ToolsList,
    ToolsCall,
    /// `notifications/*` - accepted and never answered.
    Notification,
}

impl ProtocolMethod {
    /// Resolve a method name; unknown methods return `None`.
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "initialize" => Some(Self::Initialize),
            "ping" => Some(Self::Ping),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            m if m.starts_with("notifications/") => Some(Self::Notification),
            _ => None,
        }
    }
}

/// A parsed request envelope.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// Request id; `None` marks a notification (no response owed).
    pub id: Option<RequestId>,

    /// Raw method name.
    pub method: String,

    /// Method params, `{}` when absent.
    pub params: Value,
}

impl RequestEnvelope {
    /// Validate an already-parsed JSON value as a request envelope.
    ///
    /// Parse errors (invalid JSON) are the caller's concern; this reports
    /// structural violations (`-32600` material).
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| RagError::InvalidRequest {
            message: "request must be a JSON object".to_string(),
        })?;

        match obj.get("jsonrpc").and_then(Value::as_str) {
            Some("2.0") => {}
            _ => {
                return Err(RagError::InvalidRequest {
                    message: "missing or unsupported jsonrpc version".to_string(),
                })
            }
        }

        let method = obj
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| RagError::InvalidRequest {
                message: "missing method".to_string(),
            })?
            .to_string();

        let id = match obj.get("id") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => {
                let num = n.as_i64().ok_or_else(|| RagError::InvalidRequest {
                    message: "id must be an integer or string".to_string(),
                })?;
                Some(RequestId::Num(num))
            }
            Some(Value::String(s)) => Some(RequestId::Str(s.clone())),
            Some(_) => {
                return Err(RagError::InvalidRequest {
                    message: "id must be an integer or string".to_string(),
                })
            }
        };

        let params = obj.get("params").cloned().unwrap_or_else(|| Value::Object(Default::default()));

        Ok(Self { id, method, params })
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A response envelope: exactly one of `result` or `error`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub jsonrpc: &'static str,

    /// Matching request id; `null` only for parse-level failures.
    pub id: Option<RequestId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl ResponseEnvelope {
    /// Successful response.
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Error response with an explicit code.
    pub fn failure(id: Option<RequestId>, code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }

    /// Error response derived from a domain error.
    ///
    /// Non-public errors are surfaced generically so internals never leak.
    pub fn from_error(id: Option<RequestId>, err: &RagError, data: Option<Value>) -> Self {
        let message = if err.is_public() {
            err.to_string()
        } else {
            "Internal error".to_string()
        };
        Self::failure(id, err.rpc_code(), message, data)
    }

    /// Parse-error response (`-32700`, null id).
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::failure(None, -32700, format!("Parse error: {}", message.into()), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_type_preserved() {
        let num: RequestId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(num, RequestId::Num(7));
        assert_eq!(serde_json::to_value(&num).unwrap(), json!(7));

        let s: RequestId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(s, RequestId::Str("abc".to_string()));
        assert_eq!(serde_json::to_value(&s).unwrap(), json!("abc"));
    }

    #[test]
    fn test_envelope_requires_method() {
        let err = RequestEnvelope::from_value(&json!({"jsonrpc": "2.0", "id": 1})).unwrap_err();
        assert_eq!(err.rpc_code(), -32600);
    }

    #[test]
    fn test_envelope_requires_version() {
        let err =
            RequestEnvelope::from_value(&json!({"method": "ping", "id": 1})).unwrap_err();
        assert_eq!(err.rpc_code(), -32600);
    }

    #[test]
    fn test_null_id_is_notification() {
        let env = RequestEnvelope::from_value(
            &json!({"jsonrpc": "2.0", "id": null, "method": "notifications/initialized"}),
        )
        .unwrap();
        assert!(env.id.is_none());
    }

    #[test]
    fn test_method_parse_is_exhaustive() {
        assert_eq!(ProtocolMethod::parse("tools/list"), Some(ProtocolMethod::ToolsList));
        assert_eq!(ProtocolMethod::parse("tools/call"), Some(ProtocolMethod::ToolsCall));
        assert_eq!(ProtocolMethod::parse("initialize"), Some(ProtocolMethod::Initialize));
        assert_eq!(
            ProtocolMethod::parse("notifications/cancelled"),
            Some(ProtocolMethod::Notification)
        );
        assert_eq!(ProtocolMethod::parse("resources/list"), None);
    }

    #[test]
    fn test_response_is_result_xor_error() {
        let ok = ResponseEnvelope::success(RequestId::Num(1), json!({"pong": true}));
        let ok_json = serde_json::to_value(&ok).unwrap();
        assert!(ok_json.get("result").is_some());
        assert!(ok_json.get("error").is_none());

        let err = ResponseEnvelope::failure(Some(RequestId::Num(1)), -32601, "nope", None);
        let err_json = serde_json::to_value(&err).unwrap();
        assert!(err_json.get("result").is_none());
        assert!(err_json.get("error").is_some());
    }

    #[test]
    fn test_parse_error_has_null_id() {
        let resp = ResponseEnvelope::parse_error("bad json");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["id"], Value::Null);
        assert_eq!(json["error"]["code"], json!(-32700));
    }
}
