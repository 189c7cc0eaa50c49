//! Tool-style RPC surface: list tools, call a tool by name with JSON arguments.
//!
//! Tool specs follow the MCP `tools/list` shape (name, description, JSON Schema input) so
//! the server can hand them out unchanged.

mod geomemory;

pub use geomemory::{GeoMemoryToolSource, TOOL_EXPLORE_NEARBY, TOOL_PUBLISH_CHECKIN};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::PipelineError;

/// Tool description: name, human description and JSON Schema of the arguments.
///
/// Serializes with MCP field names (`inputSchema`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Text result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallContent {
    pub text: String,
}

/// Failure of `call_tool`.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    /// No tool with this name.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Arguments do not match the tool's schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The tool ran and failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// A set of callable tools.
///
/// **Interaction**: Implemented by `GeoMemoryToolSource`; the server maps `tools/list` and
/// `tools/call` onto it.
#[async_trait]
pub trait ToolSource: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallContent, ToolSourceError>;
}
