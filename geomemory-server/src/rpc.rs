//! JSON-RPC 2.0 over `POST /mcp`: `initialize`, `notifications/initialized`, `tools/list`,
//! `tools/call`. Plus `GET /health`.
//!
//! Protocol errors (bad JSON, unknown method, unknown tool) are JSON-RPC error objects. A tool
//! that runs and fails is a normal result with `isError: true`, so the caller sees the message.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use geomemory::{ToolSource, ToolSourceError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// MCP protocol revision answered to `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

/// Shared state for all routes.
pub struct AppState {
    pub tools: Arc<dyn ToolSource>,
    /// Deadline for one `tools/call`; the pipeline future is dropped when it passes.
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    jsonrpc: Option<String>,
    /// Absent for notifications.
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcErrorBody>,
}

impl RpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcErrorBody {
                code,
                message: message.into(),
            }),
        }
    }
}

impl IntoResponse for RpcResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Tool result in MCP shape: one text content block.
fn tool_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

/// Routes without outer layers; `main` adds tracing, CORS and the body limit.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mcp", post(mcp))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn mcp(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return RpcResponse::error(Value::Null, PARSE_ERROR, format!("parse error: {}", e))
                .into_response()
        }
    };
    let id_hint = raw.get("id").cloned().unwrap_or(Value::Null);
    let request: RpcRequest = match serde_json::from_value(raw) {
        Ok(r) => r,
        Err(e) => {
            return RpcResponse::error(id_hint, INVALID_REQUEST, format!("invalid request: {}", e))
                .into_response()
        }
    };
    if request.jsonrpc.as_deref() != Some("2.0") {
        return RpcResponse::error(id_hint, INVALID_REQUEST, "jsonrpc must be \"2.0\"")
            .into_response();
    }

    let Some(id) = request.id else {
        debug!(method = %request.method, "notification");
        return StatusCode::ACCEPTED.into_response();
    };

    debug!(method = %request.method, id = %id, "rpc request");
    let response = match request.method.as_str() {
        "initialize" => RpcResponse::result(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "geomemory", "version": env!("CARGO_PKG_VERSION") },
            }),
        ),
        "ping" => RpcResponse::result(id, json!({})),
        "tools/list" => match state.tools.list_tools().await {
            Ok(tools) => RpcResponse::result(id, json!({ "tools": tools })),
            Err(e) => RpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        },
        "tools/call" => call_tool(&state, id, request.params).await,
        other => RpcResponse::error(id, METHOD_NOT_FOUND, format!("method not found: {}", other)),
    };
    response.into_response()
}

async fn call_tool(state: &AppState, id: Value, params: Value) -> RpcResponse {
    let params: CallParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return RpcResponse::error(id, INVALID_PARAMS, format!("invalid params: {}", e)),
    };

    let call = state.tools.call_tool(&params.name, params.arguments);
    let outcome = match tokio::time::timeout(state.request_timeout, call).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(tool = %params.name, timeout_secs = state.request_timeout.as_secs(), "tool call timed out");
            return RpcResponse::result(
                id,
                tool_result(
                    format!(
                        "request timed out after {} s",
                        state.request_timeout.as_secs()
                    ),
                    true,
                ),
            );
        }
    };

    match outcome {
        Ok(content) => {
            info!(tool = %params.name, "tool call succeeded");
            RpcResponse::result(id, tool_result(content.text, false))
        }
        Err(ToolSourceError::NotFound(name)) => {
            RpcResponse::error(id, INVALID_PARAMS, format!("unknown tool: {}", name))
        }
        Err(e) => {
            warn!(tool = %params.name, error = %e, "tool call failed");
            RpcResponse::result(id, tool_result(format!("❌ {}", e), true))
        }
    }
}
