use crate::domain::ExporterError;
use axum::Router;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serve the receiver with graceful shutdown.
///
/// `shutdown_token` is cancelled on SIGINT/SIGTERM so in-flight pushes stop
/// between sends; cancelling it from elsewhere also stops the server.
pub async fn serve(
    app: Router,
    listen_address: &str,
    shutdown_token: CancellationToken,
) -> Result<(), ExporterError> {
    let listener = tokio::net::TcpListener::bind(listen_address)
        .await
        .map_err(|e| ExporterError::Bind {
            address: listen_address.to_string(),
            source: e,
        })?;
    info!("OTLP HTTP receiver listening on {}", listener.local_addr()?);
    info!("  - POST /v1/logs       (OTLP logs)");
    info!("  - GET  /v1/health     (health check)");
    info!("  - GET  /v1/stats      (dispatch statistics)");

    let token = shutdown_token.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                () = shutdown_signal() => token.cancel(),
                () = token.cancelled() => {}
            }
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, initiating graceful shutdown"),
        () = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_serve_stops_when_token_is_cancelled() {
        let app = Router::new().route("/", get(|| async { "ok" }));
        let token = CancellationToken::new();
        let handle = tokio::spawn(serve(app, "127.0.0.1:0", token.clone()));

        token.cancel();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let app = Router::new();
        let err = serve(app, "256.0.0.1:0", CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExporterError::Bind { .. }));
    }
}
