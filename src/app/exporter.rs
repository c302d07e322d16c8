use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::config::Config;
use crate::domain::ExporterError;
use crate::endpoint::{DnsResolver, EndpointResolver, EndpointState, Resolve};
use crate::mapper::{flatten, record_count};
use crate::sender::{DispatchStatsSnapshot, Dispatcher, GelfEncoder, Transport, UdpTransport};

/// Outcome of one `push_logs` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSummary {
    pub records: usize,
    pub sent: usize,
    pub failed: usize,
    pub bytes_sent: usize,
}

/// Host-facing exporter: flattens OTLP log batches and sends them as GELF.
pub struct GelfExporter<T = UdpTransport, R = DnsResolver> {
    dispatcher: Dispatcher<T, R>,
    facility: Option<String>,
}

impl GelfExporter {
    pub fn from_config(config: &Config) -> Result<Self, ExporterError> {
        let strategy = config.refresh_strategy()?;
        let encoder = GelfEncoder::new(config.compression, config.chunk_size);
        let resolver = EndpointResolver::new(config.endpoint.clone(), strategy);

        let exporter = Self::new(UdpTransport::new(encoder), resolver);
        Ok(match &config.facility {
            Some(facility) => exporter.with_facility(facility.clone()),
            None => exporter,
        })
    }
}

impl<T: Transport, R: Resolve> GelfExporter<T, R> {
    pub fn new(transport: T, resolver: EndpointResolver<R>) -> Self {
        Self {
            dispatcher: Dispatcher::new(transport, Arc::new(resolver)),
            facility: None,
        }
    }

    pub fn with_facility(mut self, facility: impl Into<String>) -> Self {
        self.facility = Some(facility.into());
        self
    }

    /// Resolve the initial destination.
    ///
    /// A failure is only logged: the next push retries resolution.
    pub async fn start(&self) -> Result<(), ExporterError> {
        let resolver = self.dispatcher.resolver();
        match resolver.force_refresh(Instant::now()).await {
            Ok(destination) => info!(
                endpoint = resolver.endpoint(),
                %destination,
                strategy = %resolver.strategy(),
                "GELF exporter started"
            ),
            Err(e) => warn!(
                endpoint = resolver.endpoint(),
                error = %e,
                "Initial endpoint resolution failed, will retry on first push"
            ),
        }
        Ok(())
    }

    /// Flatten `request` and send every record.
    ///
    /// Individual send failures are counted in the summary; the call only
    /// fails when no destination could ever be resolved or `cancel` fired.
    #[instrument(skip_all, fields(records = tracing::field::Empty))]
    pub async fn push_logs(
        &self,
        request: &ExportLogsServiceRequest,
        cancel: &CancellationToken,
    ) -> Result<PushSummary, ExporterError> {
        let records = record_count(request);
        tracing::Span::current().record("records", records);

        let facility = self.facility.as_deref();
        let messages = flatten(request).map(|message| match facility {
            Some(facility) => message.with_facility(facility),
            None => message,
        });

        let report = self.dispatcher.dispatch(messages, cancel).await?;

        let summary = PushSummary {
            records,
            sent: report.sent_count(),
            failed: report.failed_count(),
            bytes_sent: report.bytes_sent(),
        };
        debug!(?summary, "Pushed logs");
        Ok(summary)
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.dispatcher.stats().snapshot()
    }

    pub async fn endpoint_state(&self) -> EndpointState {
        self.dispatcher.resolver().snapshot().await
    }

    pub fn transport(&self) -> &T {
        self.dispatcher.transport()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::RefreshStrategy;
    use crate::test_support::{RecordingTransport, ScriptedResolver, simple_request};
    use std::net::SocketAddr;

    fn exporter(
        transport: RecordingTransport,
        script: Vec<Result<SocketAddr, ()>>,
    ) -> GelfExporter<RecordingTransport, ScriptedResolver> {
        let resolver = EndpointResolver::with_resolver(
            "graylog:12201",
            RefreshStrategy::Static,
            ScriptedResolver::new(script),
        );
        GelfExporter::new(transport, resolver)
    }

    #[tokio::test]
    async fn test_start_failure_is_not_fatal() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 12201));
        let transport = RecordingTransport::new();
        let exporter = exporter(transport.clone(), vec![Err(()), Ok(addr)]);

        assert!(exporter.start().await.is_ok());
        assert_eq!(exporter.endpoint_state().await.destination, None);

        let summary = exporter
            .push_logs(&simple_request(2), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(summary.sent, 2);
        assert_eq!(transport.destinations(), vec![addr, addr]);
    }

    #[tokio::test]
    async fn test_facility_is_applied() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 12201));
        let transport = RecordingTransport::new();
        let exporter = exporter(transport.clone(), vec![Ok(addr)]).with_facility("otel");

        exporter
            .push_logs(&simple_request(1), &CancellationToken::new())
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].1.facility.as_deref(), Some("otel"));
    }

    #[tokio::test]
    async fn test_unresolvable_push_fails() {
        let exporter = exporter(RecordingTransport::new(), vec![Err(())]);
        let err = exporter
            .push_logs(&simple_request(1), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExporterError::Dispatch(_)));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_from_config_rejects_unknown_strategy() {
        let config = Config {
            endpoint: "graylog:12201".to_string(),
            endpoint_refresh_strategy: "weekly".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            GelfExporter::from_config(&config),
            Err(ExporterError::Config(_))
        ));
    }
}
