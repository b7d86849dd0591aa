//! Permissive CORS via `tower-http`, with preflight answered as `204 No Content`.

use axum::extract::Request;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::{Any, CorsLayer};

const OPENAI_MCP_ACTION: HeaderName = HeaderName::from_static("openai-mcp-action");
const X_MCP_ACTION: HeaderName = HeaderName::from_static("x-mcp-action");

/// Every response allows any origin; `OPTIONS` is answered by the layer itself.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, OPENAI_MCP_ACTION, X_MCP_ACTION])
}

/// `CorsLayer` answers preflight with 200; clients here expect 204.
pub async fn preflight_no_content(req: Request, next: Next) -> Response {
    let preflight = req.method() == Method::OPTIONS;
    let mut resp = next.run(req).await;
    if preflight && resp.status() == StatusCode::OK {
        *resp.status_mut() = StatusCode::NO_CONTENT;
    }
    resp
}
