//! Command-line / environment configuration.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;
use unrelated_order_tools::client::{ClientSettings, UpstreamAuth};
use unrelated_order_tools::safety::DEFAULT_MAX_RESPONSE_BYTES;

#[derive(Debug, Clone, Parser)]
#[command(name = "unrelated-order-adapter", version, about)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, env = "ORDER_MCP_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Log level (`RUST_LOG` takes precedence when set).
    #[arg(long, env = "ORDER_MCP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "ORDER_MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Per-request timeout for upstream calls, in seconds.
    #[arg(long, env = "ORDER_MCP_UPSTREAM_TIMEOUT_SECS", default_value_t = 15)]
    pub upstream_timeout_secs: u64,

    /// How tenant credentials are sent upstream.
    #[arg(long, env = "ORDER_MCP_UPSTREAM_AUTH", value_enum, default_value_t = AuthMode::Query)]
    pub upstream_auth: AuthMode,

    /// Maximum upstream response body size in bytes (0 disables the limit).
    #[arg(long, env = "ORDER_MCP_MAX_RESPONSE_BYTES", default_value_t = DEFAULT_MAX_RESPONSE_BYTES)]
    pub max_response_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthMode {
    Query,
    Basic,
}

impl Cli {
    #[must_use]
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            timeout: Duration::from_secs(self.upstream_timeout_secs.max(1)),
            auth: match self.upstream_auth {
                AuthMode::Query => UpstreamAuth::Query,
                AuthMode::Basic => UpstreamAuth::Basic,
            },
            max_response_bytes: (self.max_response_bytes > 0).then_some(self.max_response_bytes),
        }
    }
}
