//! Process shutdown plumbing
//!
//! One `watch` channel carries the shutdown flag. The OS signal listener
//! publishes `true` on it; the HTTP server drains in-flight requests and the
//! background jobs stop once they observe it.

use tokio::sync::watch;

/// Resolve once `true` is published, or once every sender is gone.
pub async fn wait_for_shutdown(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow_and_update() {
        if shutdown_rx.changed().await.is_err() {
            return;
        }
    }
}

/// Wait for Ctrl+C (or SIGTERM on unix) and publish shutdown.
pub async fn shutdown_on_signal(shutdown_tx: watch::Sender<bool>) {
    os_signal().await;
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}

#[cfg(unix)]
async fn os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn os_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
