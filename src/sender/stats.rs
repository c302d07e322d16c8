// Lock-free dispatch statistics using atomic operations
//
// Counters are updated from the dispatch loop and read by the host
// through snapshots.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Default)]
pub struct DispatchStats {
    batches: AtomicU64,
    messages_sent: AtomicU64,
    messages_failed: AtomicU64,
    bytes_sent: AtomicU64,
    cancelled_batches: AtomicU64,
    unresolved_batches: AtomicU64,
    last_send_time: AtomicU64,
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a non-empty push
    pub fn record_batch(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message handed to the socket
    pub fn record_sent(&self, bytes: u64) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        self.last_send_time.store(now, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.messages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.cancelled_batches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a push dropped because no destination was ever resolved
    pub fn record_unresolved(&self) {
        self.unresolved_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            batches: self.batches.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_failed: self.messages_failed.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            cancelled_batches: self.cancelled_batches.load(Ordering::Relaxed),
            unresolved_batches: self.unresolved_batches.load(Ordering::Relaxed),
            last_send_time: self.last_send_time.load(Ordering::Relaxed),
        }
    }

    /// Reset all statistics (mainly for testing)
    pub fn reset(&self) {
        self.batches.store(0, Ordering::Relaxed);
        self.messages_sent.store(0, Ordering::Relaxed);
        self.messages_failed.store(0, Ordering::Relaxed);
        self.bytes_sent.store(0, Ordering::Relaxed);
        self.cancelled_batches.store(0, Ordering::Relaxed);
        self.unresolved_batches.store(0, Ordering::Relaxed);
        self.last_send_time.store(0, Ordering::Relaxed);
    }
}

/// Immutable snapshot of dispatch statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStatsSnapshot {
    pub batches: u64,
    pub messages_sent: u64,
    pub messages_failed: u64,
    pub bytes_sent: u64,
    pub cancelled_batches: u64,
    pub unresolved_batches: u64,
    pub last_send_time: u64,
}

impl DispatchStatsSnapshot {
    /// Share of attempted messages that reached the socket (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        let attempted = self.messages_sent + self.messages_failed;
        if attempted == 0 {
            return 1.0;
        }

        (self.messages_sent as f64) / (attempted as f64)
    }
}
