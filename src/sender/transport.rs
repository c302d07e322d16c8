use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use super::gelf::GelfEncoder;
use crate::domain::FlatMessage;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("GELF encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Compression failed: {0}")]
    Compress(#[source] std::io::Error),
    #[error("Failed to bind UDP socket on {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to send datagram to {destination}: {source}")]
    Send {
        destination: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Message needs {chunks} chunks, more than the GELF limit of {max}")]
    TooManyChunks { chunks: usize, max: usize },
}

/// Writes one message to a destination and reports the bytes written.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        destination: SocketAddr,
        message: &FlatMessage,
    ) -> impl Future<Output = Result<usize, TransportError>> + Send;
}

/// GELF over UDP.
///
/// One socket per address family, bound lazily to the unspecified address
/// on an ephemeral port and reused for every send.
#[derive(Debug, Default)]
pub struct UdpTransport {
    encoder: GelfEncoder,
    v4: OnceCell<UdpSocket>,
    v6: OnceCell<UdpSocket>,
}

impl UdpTransport {
    pub fn new(encoder: GelfEncoder) -> Self {
        Self {
            encoder,
            v4: OnceCell::new(),
            v6: OnceCell::new(),
        }
    }

    pub fn encoder(&self) -> &GelfEncoder {
        &self.encoder
    }

    async fn socket_for(&self, destination: SocketAddr) -> Result<&UdpSocket, TransportError> {
        let (cell, local) = match destination {
            SocketAddr::V4(_) => (&self.v4, SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))),
            SocketAddr::V6(_) => (&self.v6, SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))),
        };

        cell.get_or_try_init(|| async move {
            let socket = UdpSocket::bind(local)
                .await
                .map_err(|source| TransportError::Bind {
                    address: local,
                    source,
                })?;
            debug!(local = ?socket.local_addr().ok(), "Bound GELF UDP socket");
            Ok(socket)
        })
        .await
    }
}

impl Transport for UdpTransport {
    async fn send(
        &self,
        destination: SocketAddr,
        message: &FlatMessage,
    ) -> Result<usize, TransportError> {
        let datagrams = self.encoder.encode(message)?;
        let socket = self.socket_for(destination).await?;

        let mut written = 0;
        for datagram in &datagrams {
            written += socket
                .send_to(datagram, destination)
                .await
                .map_err(|source| TransportError::Send {
                    destination,
                    source,
                })?;
        }

        trace!(%destination, datagrams = datagrams.len(), bytes = written, "Sent GELF message");
        Ok(written)
    }
}
