//! HTTP error responses.
//!
//! Every non-2xx body is `{"error": <code>, "message"?: ..., ...}`; internal details are logged,
//! never returned.

use axum::Json;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::error;
use unrelated_order_tools::tool::ToolError;

#[derive(Debug, Error)]
#[error("{code} ({status})")]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: Option<String>,
    fields: Map<String, Value>,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str) -> Self {
        Self {
            status,
            code,
            message: None,
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }

    #[must_use]
    pub fn invalid_json(e: &serde_json::Error) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_json")
            .with_message(format!("request body is not valid JSON: {e}"))
    }

    #[must_use]
    pub fn no_route(path: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "no_route").with_message(format!("no route for {path}"))
    }

    #[must_use]
    pub fn method_not_allowed(method: &Method) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed")
            .with_message(format!("method {method} is not allowed here"))
    }

    /// Map a tool failure to its HTTP form. `tenants` is echoed for `unknown_tenant`.
    #[must_use]
    pub fn from_tool_error(e: ToolError, tenants: Vec<String>) -> Self {
        let code = e.code();
        match e {
            ToolError::UnknownTenant(_) => Self::new(StatusCode::BAD_REQUEST, code)
                .with_message(e.to_string())
                .with_field("tenants", tenants),
            ToolError::MissingArguments(_)
            | ToolError::InvalidArguments(_)
            | ToolError::BadTenantConfig(_)
            | ToolError::UnknownTool(_) => {
                Self::new(StatusCode::BAD_REQUEST, code).with_message(e.to_string())
            }
            ToolError::Upstream { status, detail } => {
                let mut out = Self::new(StatusCode::BAD_GATEWAY, code)
                    .with_message("upstream request failed")
                    .with_field("detail", detail);
                if let Some(status) = status {
                    out = out.with_field("status", status);
                }
                out
            }
            ToolError::UpstreamTimeout => {
                Self::new(StatusCode::GATEWAY_TIMEOUT, code).with_message(e.to_string())
            }
            ToolError::Internal(detail) => {
                error!(error = %detail, "internal error while calling tool");
                Self::internal()
            }
        }
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error").with_message("internal error")
    }

    fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("error".to_string(), json!(self.code));
        if let Some(message) = &self.message {
            body.insert("message".to_string(), json!(message));
        }
        for (k, v) in &self.fields {
            body.insert(k.clone(), v.clone());
        }
        Value::Object(body)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}
