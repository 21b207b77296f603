use tokio::signal;

/// Resolves on Ctrl+C. A failed handler install never resolves.
pub(crate) async fn interrupted() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }

    tracing::info!("interrupt received");
}
