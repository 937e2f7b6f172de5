use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::constants::{
    DEFAULT_PROTOCOL_VERSION, EXTRACT_FILE_TOOL, INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND,
    SERVER_NAME, SERVER_VERSION, TOOL_EXECUTION_ERROR,
};
use crate::error::ExtractionError;
use crate::extractor::FileExtractor;
use crate::protocol::{Incoming, InitializeParams, JsonRpcResponse, RequestKind, ToolCallParams};
use crate::tika::ExtractionResult;
use crate::tools::{tool_catalog, ExtractFileParams, ExtractFileResult};

/// Lifecycle of the single client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Uninitialized,
    Ready,
    Closed,
}

/// Line-oriented JSON-RPC dispatcher.
///
/// Lines are handled strictly one at a time: a `tools/call` runs to
/// completion and its response is flushed before the next line is read.
pub struct Server<E> {
    extractor: E,
    state: ServerState,
}

/// Run the MCP server with JSON-RPC stdio communication
pub async fn run_server<E: FileExtractor>(extractor: E) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    info!(name = SERVER_NAME, version = SERVER_VERSION, "Serving JSON-RPC on stdio");
    Server::new(extractor).run(stdin, &mut stdout).await
}

impl<E: FileExtractor> Server<E> {
    pub fn new(extractor: E) -> Self {
        Server {
            extractor,
            state: ServerState::Uninitialized,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Serve until `reader` reaches end of input.
    ///
    /// Bad input never stops the loop; only failing to read input or to
    /// write a response is returned as an error.
    pub async fn run<R, W>(&mut self, mut reader: R, writer: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let bytes_read = reader
                .read_until(b'\n', &mut buf)
                .await
                .context("Failed to read from stdin - critical I/O error")?;

            if bytes_read == 0 {
                break;
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim(),
                Err(e) => {
                    error!(error = %e, "Dropping input line that is not valid UTF-8");
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            debug!(line, "Received");
            if let Some(response) = self.handle_line(line).await {
                write_response(writer, &response).await?;
            }
        }

        self.state = ServerState::Closed;
        info!("End of input, exiting");
        Ok(())
    }

    /// Handle one input line, returning the response to send, if any
    pub async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let incoming = match Incoming::parse(line) {
            Ok(incoming) => incoming,
            Err(e) => {
                error!(error = %e, line, "Failed to parse JSON-RPC message");
                return None;
            }
        };

        let Some(id) = incoming.id.clone() else {
            self.handle_notification(incoming.kind);
            return None;
        };

        if !incoming.has_supported_version() {
            let version = incoming.version_text();
            warn!(version = %version, "Rejecting request with unsupported JSON-RPC version");
            return Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid JSON-RPC version: {version}. Expected {JSONRPC_VERSION}"),
            ));
        }

        let response = self.handle_request(id, incoming.kind).await;
        if response.is_error() {
            debug!(?response, "Sending error response");
        }
        Some(response)
    }

    /// Handle a JSON-RPC notification (no response needed)
    fn handle_notification(&mut self, kind: RequestKind) {
        match kind {
            RequestKind::Initialized => {
                if self.state == ServerState::Uninitialized {
                    warn!("Received initialized notification before initialize request");
                } else {
                    info!("Client finished initialization");
                }
            }
            RequestKind::Unknown(method) => debug!(%method, "Ignoring unknown notification"),
            other => debug!(?other, "Ignoring request sent without an id"),
        }
    }

    /// Handle a JSON-RPC request
    async fn handle_request(&mut self, id: Value, kind: RequestKind) -> JsonRpcResponse {
        match kind {
            RequestKind::Initialize(params) => self.initialize(id, params),
            RequestKind::Initialized => JsonRpcResponse::success(id, json!({})),
            RequestKind::ToolsList => {
                if self.state == ServerState::Uninitialized {
                    warn!("tools/list received before initialize");
                }
                JsonRpcResponse::success(id, json!({ "tools": tool_catalog() }))
            }
            RequestKind::ToolsCall(params) => self.call_tool(id, params).await,
            RequestKind::Unknown(method) => {
                warn!(%method, "Unknown method");
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {method}"))
            }
        }
    }

    fn initialize(&mut self, id: Value, params: InitializeParams) -> JsonRpcResponse {
        if self.state == ServerState::Ready {
            warn!("Repeated initialize request");
        }
        if let Some(client_info) = &params.client_info {
            info!(%client_info, "Client connected");
        }
        if let Some(capabilities) = &params.capabilities {
            debug!(%capabilities, "Client capabilities");
        }

        let protocol_version = params
            .protocol_version
            .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string());

        self.state = ServerState::Ready;

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": protocol_version,
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION }
            }),
        )
    }

    async fn call_tool(&self, id: Value, params: ToolCallParams) -> JsonRpcResponse {
        let tool_name = params.tool_name();
        if tool_name != EXTRACT_FILE_TOOL {
            warn!(tool = %tool_name, "Unknown tool");
            return JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Tool not found: {tool_name}"));
        }

        match self.extract_file(params.arguments).await {
            Ok(result) => JsonRpcResponse::success(id, json!(ExtractFileResult::from(result))),
            Err(e) => {
                error!(error = %e, "extract_file failed");
                JsonRpcResponse::error(id, TOOL_EXECUTION_ERROR, format!("Error extracting file: {e}"))
            }
        }
    }

    async fn extract_file(&self, arguments: Value) -> Result<ExtractionResult, ExtractionError> {
        let params: ExtractFileParams =
            serde_json::from_value(arguments).map_err(ExtractionError::InvalidArguments)?;

        info!(file_path = %params.file_path, tika_url = %params.tika_url, "Extracting file");
        self.extractor.extract(&params.file_path, &params.tika_url).await
    }
}

/// Write one response line and flush it. Failures here are fatal.
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &JsonRpcResponse) -> Result<()> {
    let mut response_json =
        serde_json::to_string(response).context("Failed to serialize response - critical error")?;
    debug!(response = %response_json, "Sending");

    response_json.push('\n');
    writer
        .write_all(response_json.as_bytes())
        .await
        .context("Failed to write response to stdout - critical I/O error")?;
    writer
        .flush()
        .await
        .context("Failed to flush stdout - critical I/O error")?;
    Ok(())
}
