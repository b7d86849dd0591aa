use anyhow::Context as _;
use std::net::TcpListener;
use std::process::Child;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Child process (the adapter binary under test) killed and reaped on drop.
pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Ephemeral localhost port for a child process to bind. The port is released before
/// returning, so another process may still take it first.
///
/// # Errors
///
/// Returns an error if no ephemeral port can be bound.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let port = TcpListener::bind(("127.0.0.1", 0))
        .and_then(|l| l.local_addr())
        .context("bind ephemeral port")?
        .port();
    Ok(port)
}

/// Poll `url` with `client` until it answers 2xx, giving up after `timeout_dur`.
///
/// # Errors
///
/// Returns an error carrying the last observed status or transport error once the deadline
/// passes.
pub async fn wait_http_ok(
    client: &reqwest::Client,
    url: &str,
    timeout_dur: Duration,
) -> anyhow::Result<()> {
    let deadline = Instant::now() + timeout_dur;
    let mut last = String::from("no attempt");
    while Instant::now() < deadline {
        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            Ok(resp) => last = format!("status {}", resp.status()),
            Err(e) => last = e.to_string(),
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    anyhow::bail!("{url} not ready after {timeout_dur:?}: {last}")
}

/// An axum router served on an ephemeral localhost port; stopped on drop.
pub struct TestServer {
    pub base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// `base_url` joined with `path` (which should start with `/`).
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

/// Serve `router` in-process on `127.0.0.1:0`.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn spawn_router(router: axum::Router) -> anyhow::Result<TestServer> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind test server")?;
    let addr = listener.local_addr().context("local_addr")?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = shutdown_rx.await;
    });
    let handle = tokio::spawn(async move {
        let _ = server.await;
    });

    Ok(TestServer {
        base_url: format!("http://{addr}"),
        shutdown: Some(shutdown_tx),
        handle,
    })
}
