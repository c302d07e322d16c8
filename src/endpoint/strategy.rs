use std::fmt;
use std::time::{Duration, Instant};

pub const STRATEGY_NONE: &str = "none";
pub const STRATEGY_PER_BATCH: &str = "perbatch";
pub const STRATEGY_INTERVAL: &str = "interval";

/// When the configured endpoint is re-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStrategy {
    /// Resolve once and keep the address for the process lifetime.
    Static,
    /// Resolve at the start of every push.
    PerBatch,
    /// Resolve again once the interval has elapsed since the last attempt.
    Interval(Duration),
}

/// Where in a push the destination is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPoint {
    BatchStart,
    Message,
}

impl RefreshStrategy {
    /// Whether a refresh should happen at `point`, given the last attempt.
    pub fn is_due(&self, point: RefreshPoint, last_refresh: Instant, now: Instant) -> bool {
        match self {
            RefreshStrategy::Static => false,
            RefreshStrategy::PerBatch => point == RefreshPoint::BatchStart,
            RefreshStrategy::Interval(interval) => {
                now.saturating_duration_since(last_refresh) >= *interval
            }
        }
    }

    /// A per-batch destination stays fixed for all messages of one push.
    pub fn pins_destination_per_batch(&self) -> bool {
        matches!(self, RefreshStrategy::PerBatch)
    }

    pub fn name(&self) -> &'static str {
        match self {
            RefreshStrategy::Static => STRATEGY_NONE,
            RefreshStrategy::PerBatch => STRATEGY_PER_BATCH,
            RefreshStrategy::Interval(_) => STRATEGY_INTERVAL,
        }
    }
}

impl fmt::Display for RefreshStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshStrategy::Interval(interval) => {
                write!(f, "{}({}s)", self.name(), interval.as_secs())
            }
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_is_never_due() {
        let start = Instant::now();
        let later = start + Duration::from_secs(3600);
        assert!(!RefreshStrategy::Static.is_due(RefreshPoint::BatchStart, start, later));
        assert!(!RefreshStrategy::Static.is_due(RefreshPoint::Message, start, later));
    }

    #[test]
    fn test_per_batch_only_at_batch_start() {
        let now = Instant::now();
        assert!(RefreshStrategy::PerBatch.is_due(RefreshPoint::BatchStart, now, now));
        assert!(!RefreshStrategy::PerBatch.is_due(RefreshPoint::Message, now, now));
    }

    #[test]
    fn test_interval_boundary_is_inclusive() {
        let strategy = RefreshStrategy::Interval(Duration::from_secs(60));
        let start = Instant::now();
        assert!(!strategy.is_due(RefreshPoint::Message, start, start + Duration::from_secs(59)));
        assert!(strategy.is_due(RefreshPoint::Message, start, start + Duration::from_secs(60)));
        assert!(strategy.is_due(RefreshPoint::BatchStart, start, start + Duration::from_secs(61)));
    }

    #[test]
    fn test_clock_going_backwards_is_not_due() {
        let strategy = RefreshStrategy::Interval(Duration::from_secs(1));
        let now = Instant::now();
        let last = now + Duration::from_secs(5);
        assert!(!strategy.is_due(RefreshPoint::Message, last, now));
    }

    #[test]
    fn test_display() {
        assert_eq!(RefreshStrategy::Static.to_string(), "none");
        assert_eq!(RefreshStrategy::PerBatch.to_string(), "perbatch");
        assert_eq!(
            RefreshStrategy::Interval(Duration::from_secs(60)).to_string(),
            "interval(60s)"
        );
    }
}
