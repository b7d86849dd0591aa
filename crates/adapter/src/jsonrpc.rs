//! JSON-RPC 2.0 framing of the MCP methods this server supports.
//!
//! Stateless: there are no sessions, every request is answered in its HTTP response.

use crate::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rmcp::model::{CallToolResult, Content, ErrorCode, ErrorData, JsonObject, Tool, ToolAnnotations};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error};
use unrelated_order_tools::tool::{ToolError, ToolOutcome};

pub const JSONRPC_VERSION: &str = "2.0";
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorData>,
}

impl RpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, error: ErrorData) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl IntoResponse for RpcResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Whether a decoded body is a JSON-RPC message rather than a plain tool call.
#[must_use]
pub fn is_jsonrpc(message: &Value) -> bool {
    message.get("jsonrpc").is_some()
}

pub async fn rpc_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    match serde_json::from_slice::<Value>(&body) {
        Ok(message) => handle_message(&state, message).await,
        Err(e) => RpcResponse::error(
            Value::Null,
            ErrorData::new(ErrorCode::PARSE_ERROR, format!("parse error: {e}"), None),
        )
        .into_response(),
    }
}

/// Answer a single decoded JSON-RPC message. Notifications get `202 Accepted` and no body.
pub async fn handle_message(state: &AppState, message: Value) -> Response {
    let request: RpcRequest = match serde_json::from_value(message) {
        Ok(r) => r,
        Err(_) => return invalid_request(Value::Null, "request must be a JSON object"),
    };

    if request.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
        return invalid_request(request.id.unwrap_or(Value::Null), "jsonrpc must be \"2.0\"");
    }
    let Some(method) = request.method else {
        return invalid_request(request.id.unwrap_or(Value::Null), "missing method");
    };
    let Some(id) = request.id else {
        debug!(method = %method, "json-rpc notification");
        return StatusCode::ACCEPTED.into_response();
    };

    let params = request.params.unwrap_or(Value::Null);
    let outcome = match method.as_str() {
        "initialize" => Ok(initialize_result(&params)),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": list_tools(state) })),
        "tools/call" => call_tool(state, &params).await,
        other => Err(ErrorData::new(
            ErrorCode::METHOD_NOT_FOUND,
            format!("method not found: {other}"),
            None,
        )),
    };

    let response = match outcome {
        Ok(result) => RpcResponse::result(id, result),
        Err(error) => RpcResponse::error(id, error),
    };
    response.into_response()
}

fn invalid_request(id: Value, message: &'static str) -> Response {
    RpcResponse::error(id, ErrorData::new(ErrorCode::INVALID_REQUEST, message, None))
        .into_response()
}

fn initialize_result(params: &Value) -> Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);
    json!({
        "protocolVersion": protocol_version,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

fn list_tools(state: &AppState) -> Vec<Tool> {
    let def = state.tool().definition();
    let schema_obj = def
        .input_schema
        .as_object()
        .cloned()
        .unwrap_or_else(JsonObject::new);
    let mut tool = Tool::new(def.name, def.description, Arc::new(schema_obj));
    tool.annotations = Some(ToolAnnotations {
        title: None,
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(true),
    });
    vec![tool]
}

async fn call_tool(state: &AppState, params: &Value) -> Result<Value, ErrorData> {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Err(ErrorData::new(
            ErrorCode::INVALID_PARAMS,
            "tools/call requires a string 'name'",
            Some(json!({ "error": "missing_arguments" })),
        ));
    };
    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => Value::Object(JsonObject::new()),
        Some(v) => v.clone(),
    };

    let result = match state.tool().call_named(name, &arguments).await {
        Ok(outcome) => outcome_result(outcome)?,
        Err(e) => return Err(tool_error(state, e)),
    };
    serde_json::to_value(&result).map_err(|e| internal(&e.to_string()))
}

fn outcome_result(outcome: ToolOutcome) -> Result<CallToolResult, ErrorData> {
    let (structured, is_error) = match outcome {
        ToolOutcome::Found(order) => (
            serde_json::to_value(&*order).map_err(|e| internal(&e.to_string()))?,
            false,
        ),
        other => (json!({ "ok": false, "reason": other.reason() }), true),
    };
    Ok(CallToolResult {
        content: vec![Content::text(structured.to_string())],
        structured_content: Some(structured),
        is_error: Some(is_error),
        meta: None,
    })
}

fn tool_error(state: &AppState, e: ToolError) -> ErrorData {
    let code = e.code();
    if e.is_caller_error() {
        let mut data = json!({ "error": code });
        if matches!(e, ToolError::UnknownTenant(_)) {
            data["tenants"] = json!(state.tool().registry().tenant_ids());
        }
        return ErrorData::new(ErrorCode::INVALID_PARAMS, e.to_string(), Some(data));
    }
    match e {
        ToolError::Upstream { status, .. } => ErrorData::new(
            ErrorCode::INTERNAL_ERROR,
            "upstream request failed",
            Some(json!({ "error": code, "status": status })),
        ),
        ToolError::Internal(detail) => internal(&detail),
        other => ErrorData::new(
            ErrorCode::INTERNAL_ERROR,
            other.to_string(),
            Some(json!({ "error": code })),
        ),
    }
}

fn internal(detail: &str) -> ErrorData {
    error!(error = %detail, "internal error while calling tool");
    ErrorData::new(
        ErrorCode::INTERNAL_ERROR,
        "internal error",
        Some(json!({ "error": "internal_error" })),
    )
}
