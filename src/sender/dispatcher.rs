use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::stats::DispatchStats;
use super::transport::{Transport, TransportError};
use crate::domain::FlatMessage;
use crate::endpoint::{EndpointResolver, RefreshPoint, Resolve, ResolutionError};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("No destination available: {0}")]
    NoDestination(#[from] ResolutionError),
    #[error("Dispatch cancelled: {sent} sent, {failed} failed, {remaining} not attempted")]
    Cancelled {
        sent: usize,
        failed: usize,
        remaining: usize,
    },
}

#[derive(Debug)]
pub enum SendOutcome {
    Sent { bytes: usize },
    Failed(TransportError),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }
}

#[derive(Debug)]
pub struct MessageOutcome {
    pub index: usize,
    pub destination: SocketAddr,
    pub outcome: SendOutcome,
}

/// Per-message result of one dispatch call, in send order.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<MessageOutcome>,
}

impl DispatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn sent_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_sent()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.sent_count()
    }

    pub fn bytes_sent(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.outcome {
                SendOutcome::Sent { bytes } => bytes,
                SendOutcome::Failed(_) => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MessageOutcome> {
        self.outcomes.iter().filter(|o| !o.outcome.is_sent())
    }
}

/// Sends flattened messages one by one, asking the endpoint resolver for
/// the destination as its strategy requires.
pub struct Dispatcher<T, R> {
    transport: T,
    resolver: Arc<EndpointResolver<R>>,
    stats: Arc<DispatchStats>,
}

impl<T: Transport, R: Resolve> Dispatcher<T, R> {
    pub fn new(transport: T, resolver: Arc<EndpointResolver<R>>) -> Self {
        Self {
            transport,
            resolver,
            stats: Arc::new(DispatchStats::new()),
        }
    }

    pub fn resolver(&self) -> &Arc<EndpointResolver<R>> {
        &self.resolver
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn stats(&self) -> &Arc<DispatchStats> {
        &self.stats
    }

    /// Send every message in order.
    ///
    /// Transport failures are recorded per message and never abort the
    /// batch. Only an unavailable destination or cancellation fail the call.
    pub async fn dispatch<I>(
        &self,
        messages: I,
        cancel: &CancellationToken,
    ) -> Result<DispatchReport, DispatchError>
    where
        I: IntoIterator<Item = FlatMessage>,
    {
        let mut messages = messages.into_iter().peekable();
        if messages.peek().is_none() {
            return Ok(DispatchReport::default());
        }

        self.stats.record_batch();

        if cancel.is_cancelled() {
            return Err(self.cancelled(&DispatchReport::default(), messages.count()));
        }

        let batch_destination = match self
            .resolver
            .destination(RefreshPoint::BatchStart, Instant::now())
            .await
        {
            Ok(destination) => destination,
            Err(e) => {
                self.stats.record_unresolved();
                return Err(e.into());
            }
        };
        let pinned = self.resolver.strategy().pins_destination_per_batch();

        let mut report = DispatchReport::default();
        let mut index = 0;
        while let Some(message) = messages.next() {
            if cancel.is_cancelled() {
                return Err(self.cancelled(&report, 1 + messages.count()));
            }

            let destination = if index == 0 || pinned {
                batch_destination
            } else {
                self.resolver
                    .destination(RefreshPoint::Message, Instant::now())
                    .await?
            };

            let outcome = match self.transport.send(destination, &message).await {
                Ok(bytes) => {
                    self.stats.record_sent(bytes as u64);
                    SendOutcome::Sent { bytes }
                }
                Err(e) => {
                    error!(
                        index,
                        %destination,
                        host = %message.host,
                        error = %e,
                        "Failed to send GELF message"
                    );
                    self.stats.record_failed();
                    SendOutcome::Failed(e)
                }
            };

            report.outcomes.push(MessageOutcome {
                index,
                destination,
                outcome,
            });
            index += 1;
        }

        debug!(
            sent = report.sent_count(),
            failed = report.failed_count(),
            bytes = report.bytes_sent(),
            "Dispatched batch"
        );
        Ok(report)
    }

    fn cancelled(&self, report: &DispatchReport, remaining: usize) -> DispatchError {
        let sent = report.sent_count();
        let failed = report.failed_count();
        warn!(sent, failed, remaining, "Dispatch cancelled");
        self.stats.record_cancelled();
        DispatchError::Cancelled {
            sent,
            failed,
            remaining,
        }
    }
}
