use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::constants::JSONRPC_VERSION;

/// MCP Initialize request parameters
#[derive(Debug, Default, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: Option<String>,
    pub capabilities: Option<Value>,
    #[serde(rename = "clientInfo")]
    pub client_info: Option<Value>,
}

/// `tools/call` parameters, before the tool's own arguments are decoded
#[derive(Debug, Default, Deserialize)]
pub struct ToolCallParams {
    /// Kept raw so a non-string name can still be reported back
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCallParams {
    pub fn tool_name(&self) -> String {
        display_member(&self.name)
    }
}

/// What a line asks the server to do
#[derive(Debug)]
pub enum RequestKind {
    Initialize(InitializeParams),
    Initialized,
    ToolsList,
    ToolsCall(ToolCallParams),
    Unknown(String),
}

impl RequestKind {
    fn from_parts(method: Option<&Value>, params: Option<Value>) -> Self {
        let method = match method {
            Some(Value::String(method)) => method.as_str(),
            other => return RequestKind::Unknown(other.map(display_member).unwrap_or_default()),
        };
        let params = params.unwrap_or(Value::Null);
        match method {
            "initialize" => RequestKind::Initialize(decode_params(method, params)),
            // Some hosts send the namespaced form
            "initialized" | "notifications/initialized" => RequestKind::Initialized,
            "tools/list" => RequestKind::ToolsList,
            "tools/call" => RequestKind::ToolsCall(decode_params(method, params)),
            _ => RequestKind::Unknown(method.to_string()),
        }
    }
}

/// Missing or ill-shaped params fall back to the empty parameter set
fn decode_params<T: Default + DeserializeOwned>(method: &str, params: Value) -> T {
    if params.is_null() {
        return T::default();
    }
    serde_json::from_value(params).unwrap_or_else(|e| {
        warn!(method, error = %e, "Ignoring ill-formed params");
        T::default()
    })
}

/// Strings as-is, anything else as compact JSON; null reads as empty
fn display_member(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One parsed input line
#[derive(Debug)]
pub struct Incoming {
    /// `Some(Value::Null)` when the message carries `"id": null`
    pub id: Option<Value>,
    pub jsonrpc: Option<Value>,
    pub kind: RequestKind,
}

impl Incoming {
    /// Parse one line. Fails only when the line is not a JSON object, so the
    /// id of any object is always recovered.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let mut object: Map<String, Value> = match serde_json::from_str(line)? {
            Value::Object(object) => object,
            _ => return Err(serde_json::Error::custom("expected a JSON object")),
        };

        let method = object.remove("method");
        Ok(Incoming {
            id: object.remove("id"),
            jsonrpc: object.remove("jsonrpc"),
            kind: RequestKind::from_parts(method.as_ref(), object.remove("params")),
        })
    }

    /// A message without an `id` member never gets a response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// An absent `jsonrpc` member is tolerated; anything but `"2.0"` is not
    pub fn has_supported_version(&self) -> bool {
        match &self.jsonrpc {
            None => true,
            Some(Value::String(version)) => version == JSONRPC_VERSION,
            Some(_) => false,
        }
    }

    pub fn version_text(&self) -> String {
        self.jsonrpc.as_ref().map(display_member).unwrap_or_default()
    }
}

/// JSON-RPC response structure
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        JsonRpcResponse {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        JsonRpcResponse {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
