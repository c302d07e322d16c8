//! Message dispatch to the GELF endpoint
//!
//! This module provides:
//! - `Dispatcher`: the per-push send loop
//! - `Transport` / `UdpTransport`: datagram delivery
//! - `GelfEncoder`: JSON, compression and chunking
//! - `DispatchStats`: lock-free counters

pub mod dispatcher;
pub mod gelf;
pub mod stats;
pub mod transport;

pub use dispatcher::{DispatchError, DispatchReport, Dispatcher, MessageOutcome, SendOutcome};
pub use gelf::{Compression, GelfEncoder};
pub use stats::{DispatchStats, DispatchStatsSnapshot};
pub use transport::{Transport, TransportError, UdpTransport};
