use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::EXTRACT_FILE_TOOL;
use crate::tika::ExtractionResult;

/// MCP Tool definition
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// The tool catalog served by `tools/list`. Always exactly one entry.
pub fn tool_catalog() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor {
        name: EXTRACT_FILE_TOOL,
        description: "Extract content and metadata from a file using Apache Tika.",
        input_schema: json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file."
                },
                "tika_url": {
                    "type": "string",
                    "description": "URL of the running Tika server."
                }
            },
            "required": ["file_path", "tika_url"]
        }),
    }]
}

/// Tool parameters for extract_file
#[derive(Debug, Deserialize)]
pub struct ExtractFileParams {
    pub file_path: String,
    pub tika_url: String,
}

/// Text block inside a tool result
#[derive(Debug, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Tool result for extract_file
#[derive(Debug, Serialize)]
pub struct ExtractFileResult {
    pub metadata: serde_json::Map<String, Value>,
    pub content: Vec<TextContent>,
}

impl From<ExtractionResult> for ExtractFileResult {
    fn from(result: ExtractionResult) -> Self {
        ExtractFileResult {
            metadata: result.metadata,
            content: vec![TextContent {
                kind: "text",
                text: result.content,
            }],
        }
    }
}
