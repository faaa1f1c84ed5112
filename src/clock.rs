use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Time source in epoch milliseconds.
///
/// Every expiry decision goes through a clock handed to the session context,
/// never the ambient system time, so expiry is testable and hosts with their
/// own notion of time (enclaves, replayed sessions) can supply it.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall-clock time via chrono.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis() as u64
    }
}

/// Manually driven clock for tests and deterministic hosts.
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(now_ms)))
    }

    pub fn set(&self, now_ms: u64) {
        self.0.store(now_ms, Ordering::Relaxed);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.0.fetch_add(delta_ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
