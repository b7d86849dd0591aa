//! The `getOrderDetails` tool: argument validation, descriptor and invocation.
//!
//! Every transport (plain REST, query-routed endpoint, JSON-RPC) calls into
//! [`OrderDetailsTool`]; none of them re-implement any of the steps below.

use crate::authorize::{Authorization, authorize};
use crate::client::{OrderApi, UpstreamError};
use crate::model::NormalizedOrder;
use crate::normalize::normalize;
use crate::resolver::{ResolveError, resolve_order};
use crate::tenants::{TenantConfig, TenantLookupError, TenantRegistry};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const TOOL_NAME: &str = "getOrderDetails";
/// Older clients call the snake_case name.
pub const LEGACY_TOOL_NAME: &str = "get_order_details";
/// Advertised in the schema enum when no tenant is configured.
pub const PLACEHOLDER_TENANT: &str = "demo";

const TOOL_DESCRIPTION: &str = "Returns WooCommerce order details by order id or order number. \
    The supplied email must match the order's billing email; personal data in the result is masked.";

const ARG_TENANT: &str = "tenant";
const ARG_ORDER_REF: &str = "orderRef";
const ARG_ORDER_ID: &str = "orderId";
const ARG_EMAIL: &str = "email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub tenant: String,
    pub order_ref: String,
    pub email: String,
}

/// Tool descriptor as served by the discovery endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Found(Box<NormalizedOrder>),
    NotFound,
    EmailMismatch,
}

impl ToolOutcome {
    /// Reason code for non-`Found` outcomes.
    #[must_use]
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Found(_) => None,
            Self::NotFound => Some("order_not_found"),
            Self::EmailMismatch => Some("email_mismatch"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing required argument(s): {}", .0.join(", "))]
    MissingArguments(Vec<&'static str>),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("unknown tenant '{0}'")]
    UnknownTenant(String),
    #[error("tenant '{0}' is not fully configured")]
    BadTenantConfig(String),
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("upstream request failed")]
    Upstream { status: Option<u16>, detail: String },
    #[error("upstream request timed out")]
    UpstreamTimeout,
    #[error("internal error")]
    Internal(String),
}

impl ToolError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingArguments(_) => "missing_arguments",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::UnknownTenant(_) => "unknown_tenant",
            Self::BadTenantConfig(_) => "bad_tenant_config",
            Self::UnknownTool(_) => "unknown_tool",
            Self::Upstream { .. } => "upstream_error",
            Self::UpstreamTimeout => "upstream_timeout",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Caller faults: rejected before any upstream call.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::MissingArguments(_)
                | Self::InvalidArguments(_)
                | Self::UnknownTenant(_)
                | Self::BadTenantConfig(_)
                | Self::UnknownTool(_)
        )
    }
}

impl From<UpstreamError> for ToolError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Status { status, body } => Self::Upstream {
                status: Some(status),
                detail: body,
            },
            UpstreamError::Timeout(_) => Self::UpstreamTimeout,
            UpstreamError::Transport(msg) | UpstreamError::Decode(msg) => Self::Upstream {
                status: None,
                detail: msg,
            },
            UpstreamError::Url(msg) => Self::Internal(msg),
        }
    }
}

#[must_use]
pub fn is_tool_name(name: &str) -> bool {
    name == TOOL_NAME || name == LEGACY_TOOL_NAME
}

/// Descriptor for `getOrderDetails`, with `tenant` restricted to the configured ids.
#[must_use]
pub fn tool_definition(tenant_ids: &[String]) -> ToolDefinition {
    let tenants: Vec<&str> = if tenant_ids.is_empty() {
        vec![PLACEHOLDER_TENANT]
    } else {
        tenant_ids.iter().map(String::as_str).collect()
    };

    ToolDefinition {
        name: TOOL_NAME,
        description: TOOL_DESCRIPTION,
        input_schema: json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "additionalProperties": false,
            "required": ["tenant", "orderRef", "email"],
            "properties": {
                "tenant": { "type": "string", "enum": tenants },
                "orderRef": { "type": "string", "description": "Order id or order number" },
                "email": {
                    "type": "string",
                    "format": "email",
                    "description": "Billing email of the order"
                }
            }
        }),
    }
}

/// Validate raw tool arguments.
///
/// # Errors
///
/// [`ToolError::InvalidArguments`] for non-object input, unexpected keys, wrong types or a
/// malformed email; [`ToolError::MissingArguments`] when required fields are absent or blank.
pub fn parse_arguments(arguments: &Value) -> Result<OrderQuery, ToolError> {
    let Some(map) = arguments.as_object() else {
        return Err(ToolError::InvalidArguments(
            "arguments must be a JSON object".to_string(),
        ));
    };

    if let Some(unexpected) = map
        .keys()
        .find(|k| ![ARG_TENANT, ARG_ORDER_REF, ARG_ORDER_ID, ARG_EMAIL].contains(&k.as_str()))
    {
        return Err(ToolError::InvalidArguments(format!(
            "unexpected argument '{unexpected}'"
        )));
    }

    let tenant = string_arg(map, ARG_TENANT, false)?;
    let order_ref = match string_arg(map, ARG_ORDER_REF, true)? {
        Some(r) => Some(r),
        None => string_arg(map, ARG_ORDER_ID, true)?,
    };
    let email = string_arg(map, ARG_EMAIL, false)?;

    let mut missing = Vec::new();
    if tenant.is_none() {
        missing.push(ARG_TENANT);
    }
    if order_ref.is_none() {
        missing.push(ARG_ORDER_REF);
    }
    if email.is_none() {
        missing.push(ARG_EMAIL);
    }
    let (Some(tenant), Some(order_ref), Some(email)) = (tenant, order_ref, email) else {
        return Err(ToolError::MissingArguments(missing));
    };

    if !looks_like_email(&email) {
        return Err(ToolError::InvalidArguments(
            "email must be a valid email address".to_string(),
        ));
    }

    Ok(OrderQuery {
        tenant,
        order_ref,
        email,
    })
}

/// Trimmed, non-empty string argument. Numbers are accepted where `allow_number` is set
/// (order ids are often sent unquoted).
fn string_arg(
    map: &Map<String, Value>,
    key: &str,
    allow_number: bool,
) -> Result<Option<String>, ToolError> {
    let s = match map.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) if allow_number => n.to_string(),
        Some(_) => {
            return Err(ToolError::InvalidArguments(format!(
                "'{key}' must be a string"
            )));
        }
    };
    Ok((!s.is_empty()).then_some(s))
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
}

/// Shared core: tenant lookup, order resolution, email check and normalization.
#[derive(Clone)]
pub struct OrderDetailsTool {
    registry: Arc<TenantRegistry>,
    api: Arc<dyn OrderApi>,
}

impl OrderDetailsTool {
    #[must_use]
    pub fn new(registry: Arc<TenantRegistry>, api: Arc<dyn OrderApi>) -> Self {
        Self { registry, api }
    }

    #[must_use]
    pub fn registry(&self) -> &TenantRegistry {
        &self.registry
    }

    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        tool_definition(&self.registry.tenant_ids())
    }

    /// Invoke a tool by name.
    ///
    /// # Errors
    ///
    /// [`ToolError::UnknownTool`] for names other than `getOrderDetails`/`get_order_details`,
    /// otherwise see [`OrderDetailsTool::call`].
    pub async fn call_named(&self, name: &str, arguments: &Value) -> Result<ToolOutcome, ToolError> {
        if !is_tool_name(name) {
            return Err(ToolError::UnknownTool(name.to_string()));
        }
        self.call(arguments).await
    }

    /// Run `getOrderDetails`.
    ///
    /// `order_not_found` and `email_mismatch` are outcomes, not errors.
    ///
    /// # Errors
    ///
    /// Caller errors (arguments, tenant) are returned before any upstream request. Upstream
    /// failures other than 404 are returned as [`ToolError::Upstream`] or
    /// [`ToolError::UpstreamTimeout`].
    pub async fn call(&self, arguments: &Value) -> Result<ToolOutcome, ToolError> {
        // Tenant first: an unknown tenant wins over any other argument problem.
        if let Some(tenant) = arguments
            .get(ARG_TENANT)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            self.lookup_tenant(tenant)?;
        }

        let query = parse_arguments(arguments)?;
        let tenant = self.lookup_tenant(&query.tenant)?;

        let order = match resolve_order(self.api.as_ref(), tenant, &query.order_ref).await {
            Ok(order) => order,
            Err(ResolveError::NotFound) => {
                info!(tenant = %tenant.id, order_ref = %query.order_ref, outcome = "order_not_found", "getOrderDetails");
                return Ok(ToolOutcome::NotFound);
            }
            Err(ResolveError::Upstream(e)) => {
                warn!(tenant = %tenant.id, order_ref = %query.order_ref, error = %e, "getOrderDetails upstream failure");
                return Err(e.into());
            }
        };

        if authorize(&order, &query.email) == Authorization::EmailMismatch {
            info!(tenant = %tenant.id, order_ref = %query.order_ref, outcome = "email_mismatch", "getOrderDetails");
            return Ok(ToolOutcome::EmailMismatch);
        }

        info!(tenant = %tenant.id, order_ref = %query.order_ref, outcome = "found", "getOrderDetails");
        Ok(ToolOutcome::Found(Box::new(normalize(&order))))
    }

    fn lookup_tenant(&self, tenant: &str) -> Result<&TenantConfig, ToolError> {
        self.registry.resolve(tenant).map_err(|e| match e {
            TenantLookupError::Unknown => ToolError::UnknownTenant(tenant.to_string()),
            TenantLookupError::Incomplete => ToolError::BadTenantConfig(tenant.to_string()),
        })
    }
}
