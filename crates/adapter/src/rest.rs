//! Plain HTTP surface: discovery, tool listing, invocation and the single `/mcp` endpoint
//! routed by `?m=` or an action header.

use crate::AppState;
use crate::error::ApiError;
use crate::jsonrpc;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use unrelated_order_tools::tool::{ToolError, ToolOutcome};

pub const MCP_VERSION: &str = "1.0";

/// Action headers, checked in order after the `m` query parameter.
const ACTION_HEADERS: [&str; 2] = ["openai-mcp-action", "x-mcp-action"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Discovery,
    ListTools,
    ToolCall,
}

impl Action {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" | "discovery" => Some(Self::Discovery),
            "list_tools" | "tools/list" => Some(Self::ListTools),
            "tool.call" | "tools/call" | "call" => Some(Self::ToolCall),
            _ => None,
        }
    }
}

pub async fn discovery(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "mcp_version": MCP_VERSION,
        "tools": [state.tool().definition()],
    }))
}

pub async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "tools": [state.tool().definition()] }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "tenants": state.tool().registry().len() }))
}

pub async fn tool_call(State(state): State<AppState>, body: Bytes) -> Response {
    invoke(&state, &body).await
}

/// Single-endpoint mode. A POSTed JSON-RPC message is handed to the JSON-RPC layer regardless
/// of the requested action.
pub async fn mcp_endpoint(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    if method == Method::POST
        && let Ok(message) = serde_json::from_slice::<Value>(&body)
        && jsonrpc::is_jsonrpc(&message)
    {
        return jsonrpc::handle_message(&state, message).await;
    }

    let raw = requested_action(&query, &headers).unwrap_or_default();
    let Some(action) = Action::parse(&raw) else {
        return ApiError::no_route(&format!("/mcp?m={raw}")).into_response();
    };

    match action {
        Action::Discovery => discovery(State(state)).await.into_response(),
        Action::ListTools => list_tools(State(state)).await.into_response(),
        Action::ToolCall if method == Method::POST => invoke(&state, &body).await,
        Action::ToolCall => ApiError::method_not_allowed(&method).into_response(),
    }
}

pub async fn no_route(uri: Uri) -> ApiError {
    ApiError::no_route(uri.path())
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(&method)
}

fn requested_action(query: &HashMap<String, String>, headers: &HeaderMap) -> Option<String> {
    if let Some(m) = query.get("m") {
        return Some(m.clone());
    }
    ACTION_HEADERS
        .iter()
        .find_map(|name| headers.get(*name)?.to_str().ok())
        .map(str::to_string)
}

/// Parse `{name, arguments}` and run the tool.
async fn invoke(state: &AppState, body: &[u8]) -> Response {
    let request = match parse_body(body) {
        Ok(v) => v,
        Err(e) => return ApiError::invalid_json(&e).into_response(),
    };

    let Some(name) = request.get("name").and_then(Value::as_str) else {
        return tool_error_response(state, ToolError::MissingArguments(vec!["name"]));
    };
    let arguments = match request.get("arguments") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(v) => v.clone(),
    };

    match state.tool().call_named(name, &arguments).await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => tool_error_response(state, e),
    }
}

/// An empty body counts as `{}`.
fn parse_body(body: &[u8]) -> Result<Value, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body)
}

fn outcome_response(outcome: ToolOutcome) -> Response {
    match outcome {
        ToolOutcome::Found(order) => Json(json!({ "result": order })).into_response(),
        other => {
            Json(json!({ "result": { "ok": false, "reason": other.reason() } })).into_response()
        }
    }
}

fn tool_error_response(state: &AppState, e: ToolError) -> Response {
    ApiError::from_tool_error(e, state.tool().registry().tenant_ids()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn action_parsing() {
        assert_eq!(Action::parse(""), Some(Action::Discovery));
        assert_eq!(Action::parse("list_tools"), Some(Action::ListTools));
        assert_eq!(Action::parse(" tool.call "), Some(Action::ToolCall));
        assert_eq!(Action::parse("tools/call"), Some(Action::ToolCall));
        assert_eq!(Action::parse("delete"), None);
    }

    #[test]
    fn query_wins_over_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-mcp-action", HeaderValue::from_static("list_tools"));
        assert_eq!(
            requested_action(&HashMap::new(), &headers).as_deref(),
            Some("list_tools")
        );

        headers.insert("openai-mcp-action", HeaderValue::from_static("tool.call"));
        assert_eq!(
            requested_action(&HashMap::new(), &headers).as_deref(),
            Some("tool.call")
        );

        let query = HashMap::from([("m".to_string(), "discovery".to_string())]);
        assert_eq!(requested_action(&query, &headers).as_deref(), Some("discovery"));
    }

    #[test]
    fn empty_body_is_an_empty_object() {
        assert_eq!(parse_body(b"").expect("empty"), json!({}));
        assert_eq!(parse_body(b" \n").expect("blank"), json!({}));
        assert!(parse_body(b"{").is_err());
    }
}
