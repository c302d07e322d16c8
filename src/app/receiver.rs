//! OTLP HTTP receiver
//!
//! Supports:
//! - POST /v1/logs (OTLP HTTP/protobuf)
//! - GET /v1/health
//! - GET /v1/stats (dispatch counters as JSON)

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use opentelemetry_proto::tonic::collector::logs::v1::{
    ExportLogsServiceRequest, ExportLogsServiceResponse,
};
use prost::Message;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::exporter::GelfExporter;
use crate::domain::ExporterError;
use crate::sender::DispatchError;

const PROTOBUF: &str = "application/x-protobuf";

/// Application state for the receiver handlers
#[derive(Clone)]
pub struct ReceiverState {
    pub exporter: Arc<GelfExporter>,
    /// Cancelled on shutdown; in-flight pushes stop between sends.
    pub shutdown: CancellationToken,
}

/// Create Axum router for the receiver endpoints
pub fn receiver_routes(state: ReceiverState) -> Router {
    Router::new()
        .route("/v1/logs", post(receive_logs_http))
        .route("/v1/health", get(health))
        .route("/v1/stats", get(stats))
        .with_state(state)
}

fn protobuf_response(
    status: StatusCode,
    body: Bytes,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], Bytes) {
    (status, [(header::CONTENT_TYPE, PROTOBUF)], body)
}

/// OTLP HTTP logs receiver
///
/// Accepts: application/x-protobuf
/// Returns: application/x-protobuf
#[instrument(skip(state, body), fields(body_size = body.len()))]
async fn receive_logs_http(State(state): State<ReceiverState>, body: Bytes) -> impl IntoResponse {
    let request = match ExportLogsServiceRequest::decode(body) {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to decode OTLP logs request");
            return protobuf_response(StatusCode::BAD_REQUEST, Bytes::new());
        }
    };

    match state.exporter.push_logs(&request, &state.shutdown).await {
        Ok(summary) => {
            info!(
                records = summary.records,
                sent = summary.sent,
                failed = summary.failed,
                "Forwarded OTLP logs as GELF"
            );
            let response = ExportLogsServiceResponse::default();
            protobuf_response(StatusCode::OK, Bytes::from(response.encode_to_vec()))
        }
        Err(ExporterError::Dispatch(
            e @ (DispatchError::NoDestination(_) | DispatchError::Cancelled { .. }),
        )) => {
            warn!(error = %e, "GELF endpoint unavailable");
            protobuf_response(StatusCode::SERVICE_UNAVAILABLE, Bytes::new())
        }
        Err(e) => {
            error!(error = %e, "Failed to export logs");
            protobuf_response(StatusCode::INTERNAL_SERVER_ERROR, Bytes::new())
        }
    }
}

async fn health() -> &'static str {
    "Healthy"
}

async fn stats(State(state): State<ReceiverState>) -> impl IntoResponse {
    Json(state.exporter.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::Config;
    use axum_test::TestServer;

    fn create_test_server(endpoint: &str) -> (TestServer, CancellationToken) {
        let config = Config {
            endpoint: endpoint.to_string(),
            ..Config::default()
        };
        let exporter = Arc::new(GelfExporter::from_config(&config).unwrap());
        let shutdown = CancellationToken::new();
        let app = receiver_routes(ReceiverState {
            exporter,
            shutdown: shutdown.clone(),
        });
        (TestServer::new(app).unwrap(), shutdown)
    }

    #[tokio::test]
    async fn test_health() {
        let (server, _) = create_test_server("127.0.0.1:12201");
        let response = server.get("/v1/health").await;
        response.assert_status_ok();
        response.assert_text("Healthy");
    }

    #[tokio::test]
    async fn test_logs_invalid_protobuf_returns_400() {
        let (server, _) = create_test_server("127.0.0.1:12201");
        let response = server
            .post("/v1/logs")
            .content_type(PROTOBUF)
            .bytes(Bytes::from_static(b"invalid protobuf data"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logs_empty_request_returns_200() {
        let (server, _) = create_test_server("127.0.0.1:12201");
        let body = ExportLogsServiceRequest::default().encode_to_vec();
        let response = server
            .post("/v1/logs")
            .content_type(PROTOBUF)
            .bytes(body.into())
            .await;

        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logs_after_shutdown_returns_503() {
        let (server, shutdown) = create_test_server("127.0.0.1:12201");
        shutdown.cancel();
        let body = crate::test_support::simple_request(1).encode_to_vec();
        let response = server
            .post("/v1/logs")
            .content_type(PROTOBUF)
            .bytes(body.into())
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}
