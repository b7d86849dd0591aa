use anyhow::Context as _;
use clap::Parser as _;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use unrelated_order_adapter::config::Cli;
use unrelated_order_adapter::{AppState, app, logging};
use unrelated_order_tools::client::WooClient;
use unrelated_order_tools::tenants::TenantRegistry;
use unrelated_order_tools::tool::OrderDetailsTool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format).context("init logging")?;

    let registry = TenantRegistry::from_env();
    if registry.is_empty() {
        warn!("no tenants configured; set WOO_<TENANT>_URL, _KEY and _SECRET");
    }
    for id in registry.incomplete_ids() {
        warn!(tenant = %id, "tenant is missing url, key or secret");
    }

    let client = WooClient::new(cli.client_settings()).context("build upstream client")?;
    let tool = OrderDetailsTool::new(Arc::new(registry), Arc::new(client));
    let router = app(AppState::new(tool.clone()));

    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("bind {}", cli.bind))?;
    info!(
        addr = %listener.local_addr().context("local_addr")?,
        tenants = ?tool.registry().tenant_ids(),
        "order adapter listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    info!("order adapter stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
