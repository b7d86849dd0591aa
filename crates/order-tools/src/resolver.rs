//! Resolve a free-form order reference to a concrete upstream order.
//!
//! Strategies run in a fixed order and each one either finds the order or passes. Only
//! exhausting all of them is an error; a 404 along the way is just a miss.

use crate::client::{OrderApi, UpstreamError};
use crate::model::RawOrder;
use crate::tenants::TenantConfig;
use thiserror::Error;
use tracing::debug;

pub const SEARCH_PAGE_SIZE: u32 = 20;
pub const RECENT_PAGE_SIZE: u32 = 30;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("order not found")]
    NotFound,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `GET /orders/{id}` when the reference is all digits.
    DirectId,
    /// `GET /orders?search=<ref>`.
    Search,
    /// `GET /orders?orderby=date&order=desc`, scanned for an exact match.
    RecentScan,
}

impl Strategy {
    pub const ORDER: [Self; 3] = [Self::DirectId, Self::Search, Self::RecentScan];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectId => "direct_id",
            Self::Search => "search",
            Self::RecentScan => "recent_scan",
        }
    }
}

/// Resolve `order_ref` for `tenant`.
///
/// # Errors
///
/// Returns [`ResolveError::NotFound`] when every strategy misses, or the first upstream error
/// that is not a 404.
pub async fn resolve_order(
    api: &dyn OrderApi,
    tenant: &TenantConfig,
    order_ref: &str,
) -> Result<RawOrder, ResolveError> {
    let order_ref = order_ref.trim();
    if order_ref.is_empty() {
        return Err(ResolveError::NotFound);
    }

    for strategy in Strategy::ORDER {
        debug!(tenant = %tenant.id, order_ref, strategy = strategy.as_str(), "resolving order");
        if let Some(order) = run_strategy(api, tenant, order_ref, strategy).await? {
            debug!(tenant = %tenant.id, order_ref, strategy = strategy.as_str(), id = ?order.id, "order resolved");
            return Ok(order);
        }
    }

    Err(ResolveError::NotFound)
}

async fn run_strategy(
    api: &dyn OrderApi,
    tenant: &TenantConfig,
    order_ref: &str,
    strategy: Strategy,
) -> Result<Option<RawOrder>, UpstreamError> {
    match strategy {
        Strategy::DirectId => {
            let Some(id) = numeric_id(order_ref) else {
                return Ok(None);
            };
            api.fetch_order(tenant, id).await
        }
        Strategy::Search => {
            let mut found = api
                .search_orders(tenant, order_ref, SEARCH_PAGE_SIZE)
                .await?;
            if let Some(pos) = found.iter().position(|o| o.display_number() == order_ref) {
                return Ok(Some(found.swap_remove(pos)));
            }
            // A lone hit is the only plausible candidate; the email check still guards it.
            if found.len() == 1 {
                return Ok(found.pop());
            }
            Ok(None)
        }
        Strategy::RecentScan => {
            let recent = api.recent_orders(tenant, RECENT_PAGE_SIZE).await?;
            Ok(recent.into_iter().find(|o| {
                o.display_number() == order_ref
                    || o.id.is_some_and(|id| id.to_string() == order_ref)
            }))
        }
    }
}

/// Digits-only references are candidate upstream ids.
fn numeric_id(order_ref: &str) -> Option<u64> {
    if order_ref.is_empty() || !order_ref.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    order_ref.parse().ok()
}
