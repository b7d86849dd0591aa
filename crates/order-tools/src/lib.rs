//! Order lookup core behind the `getOrderDetails` tool.
//!
//! This crate is transport-agnostic: it is used by
//! - `unrelated-order-adapter` (plain REST + MCP JSON-RPC surfaces)
//!
//! It intentionally contains **no** HTTP server, routing or framing logic.

pub mod authorize;
pub mod client;
pub mod mask;
pub mod model;
pub mod money;
pub mod normalize;
pub mod resolver;
pub mod safety;
pub mod tenants;
pub mod tool;
pub mod tracking;
