//! Termination signal handling.

/// Resolves when the process receives an interrupt or terminate request.
///
/// On unix this is `SIGINT` or `SIGTERM`; elsewhere Ctrl-C or Ctrl-Break.
/// If a handler cannot be installed the error is logged and that source is
/// ignored, leaving the other one active.
pub async fn shutdown_signal() {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received interrupt"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for interrupt");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for terminate");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(windows)]
    let terminate = async {
        match tokio::signal::windows::ctrl_break() {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received Ctrl-Break");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl-Break");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(any(unix, windows)))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}
