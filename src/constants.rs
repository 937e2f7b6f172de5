/// Server identity reported in the `initialize` response
pub const SERVER_NAME: &str = "tika-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol version used when the client does not request one
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC error codes
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const TOOL_EXECUTION_ERROR: i32 = -32000;

/// Name of the only tool exposed by this server
pub const EXTRACT_FILE_TOOL: &str = "extract_file";

/// Tika endpoints, relative to the configured base URL
pub const TIKA_META_PATH: &str = "meta";
pub const TIKA_TEXT_PATH: &str = "tika";

pub const ACCEPT_JSON: &str = "application/json";
pub const ACCEPT_TEXT: &str = "text/plain";

/// Identifier of this server inside an MCP client configuration file
pub const REGISTERED_SERVER_ID: &str = "tika-mcp-server";
