use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::strategy::{RefreshPoint, RefreshStrategy};

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Failed to resolve endpoint {endpoint}: {source}")]
    Lookup {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Endpoint {endpoint} resolved to no addresses")]
    NoRecords { endpoint: String },
    #[error("No destination has ever been resolved for endpoint {endpoint}")]
    NoDestination { endpoint: String },
}

/// Name resolution for a `host:port` endpoint.
pub trait Resolve: Send + Sync {
    fn resolve(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<SocketAddr, ResolutionError>> + Send;
}

/// Resolves through the system resolver and takes the first record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsResolver;

impl Resolve for DnsResolver {
    async fn resolve(&self, endpoint: &str) -> Result<SocketAddr, ResolutionError> {
        let mut addresses =
            tokio::net::lookup_host(endpoint)
                .await
                .map_err(|source| ResolutionError::Lookup {
                    endpoint: endpoint.to_string(),
                    source,
                })?;

        addresses.next().ok_or_else(|| ResolutionError::NoRecords {
            endpoint: endpoint.to_string(),
        })
    }
}

/// Mutable resolver state; a snapshot of it is handed out by
/// [`EndpointResolver::snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointState {
    pub destination: Option<SocketAddr>,
    pub last_refresh: Option<Instant>,
    pub refresh_count: u64,
    pub failed_refresh_count: u64,
}

/// Holds the active destination for one configured endpoint and refreshes
/// it according to its [`RefreshStrategy`].
#[derive(Debug)]
pub struct EndpointResolver<R = DnsResolver> {
    endpoint: String,
    strategy: RefreshStrategy,
    resolver: R,
    state: Mutex<EndpointState>,
}

impl EndpointResolver<DnsResolver> {
    pub fn new(endpoint: impl Into<String>, strategy: RefreshStrategy) -> Self {
        Self::with_resolver(endpoint, strategy, DnsResolver)
    }
}

impl<R: Resolve> EndpointResolver<R> {
    pub fn with_resolver(endpoint: impl Into<String>, strategy: RefreshStrategy, resolver: R) -> Self {
        Self {
            endpoint: endpoint.into(),
            strategy,
            resolver,
            state: Mutex::new(EndpointState::default()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn strategy(&self) -> RefreshStrategy {
        self.strategy
    }

    pub async fn snapshot(&self) -> EndpointState {
        self.state.lock().await.clone()
    }

    /// Destination to use at `point`.
    ///
    /// Resolution is retried on every call until it first succeeds; after
    /// that the strategy decides when to refresh.
    pub async fn destination(
        &self,
        point: RefreshPoint,
        now: Instant,
    ) -> Result<SocketAddr, ResolutionError> {
        let mut state = self.state.lock().await;

        let due = match (state.destination, state.last_refresh) {
            (Some(_), Some(last)) => self.strategy.is_due(point, last, now),
            _ => true,
        };

        if due {
            self.refresh_locked(&mut state, now).await
        } else {
            state.destination.ok_or_else(|| self.no_destination())
        }
    }

    /// Re-resolve regardless of the strategy.
    ///
    /// On failure the last-known-good destination is kept and returned.
    pub async fn force_refresh(&self, now: Instant) -> Result<SocketAddr, ResolutionError> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state, now).await
    }

    async fn refresh_locked(
        &self,
        state: &mut EndpointState,
        now: Instant,
    ) -> Result<SocketAddr, ResolutionError> {
        state.last_refresh = Some(now);
        state.refresh_count += 1;

        match self.resolver.resolve(&self.endpoint).await {
            Ok(address) => {
                if state.destination != Some(address) {
                    info!(
                        endpoint = %self.endpoint,
                        previous = ?state.destination,
                        destination = %address,
                        "Resolved GELF endpoint"
                    );
                } else {
                    debug!(endpoint = %self.endpoint, destination = %address, "Endpoint unchanged");
                }
                state.destination = Some(address);
                Ok(address)
            }
            Err(e) => {
                state.failed_refresh_count += 1;
                match state.destination {
                    Some(last_good) => {
                        warn!(
                            endpoint = %self.endpoint,
                            error = %e,
                            destination = %last_good,
                            "Endpoint refresh failed, keeping last known destination"
                        );
                        Ok(last_good)
                    }
                    None => {
                        warn!(endpoint = %self.endpoint, error = %e, "Endpoint resolution failed");
                        Err(e)
                    }
                }
            }
        }
    }

    fn no_destination(&self) -> ResolutionError {
        ResolutionError::NoDestination {
            endpoint: self.endpoint.clone(),
        }
    }
}
