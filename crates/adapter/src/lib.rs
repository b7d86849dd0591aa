//! HTTP and MCP JSON-RPC front-end for the `getOrderDetails` tool.

pub mod config;
pub mod cors;
pub mod error;
pub mod jsonrpc;
pub mod logging;
pub mod rest;

use axum::Router;
use axum::routing::{get, post};
use unrelated_order_tools::tool::OrderDetailsTool;

pub use error::ApiError;

/// Shared, immutable per-process state.
#[derive(Clone)]
pub struct AppState {
    tool: OrderDetailsTool,
}

impl AppState {
    #[must_use]
    pub fn new(tool: OrderDetailsTool) -> Self {
        Self { tool }
    }

    #[must_use]
    pub fn tool(&self) -> &OrderDetailsTool {
        &self.tool
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/mcp",
            get(rest::mcp_endpoint)
                .post(rest::mcp_endpoint)
                .fallback(rest::method_not_allowed),
        )
        .route(
            "/.well-known/mcp",
            get(rest::discovery)
                .post(rest::discovery)
                .fallback(rest::method_not_allowed),
        )
        .route(
            "/mcp/discovery",
            get(rest::discovery)
                .post(rest::discovery)
                .fallback(rest::method_not_allowed),
        )
        .route(
            "/mcp/list_tools",
            get(rest::list_tools)
                .post(rest::list_tools)
                .fallback(rest::method_not_allowed),
        )
        .route(
            "/mcp/tool.call",
            post(rest::tool_call).fallback(rest::method_not_allowed),
        )
        .route(
            "/mcp/rpc",
            post(jsonrpc::rpc_endpoint).fallback(rest::method_not_allowed),
        )
        .route(
            "/health",
            get(rest::health).fallback(rest::method_not_allowed),
        )
        .fallback(rest::no_route)
        .layer(cors::cors_layer())
        .layer(axum::middleware::from_fn(cors::preflight_no_content))
        .with_state(state)
}
