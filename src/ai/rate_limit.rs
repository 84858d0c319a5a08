use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One request per interval, shared by every caller.
///
/// The last admitted timestamp is advanced with a compare-and-swap, so two callers racing
/// inside the same window can never both get through.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    last_admitted_ms: Arc<AtomicU64>,
    interval_ms: u64,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_admitted_ms: Arc::new(AtomicU64::new(0)),
            interval_ms: interval.as_millis() as u64,
        }
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(now_millis())
    }

    pub fn try_acquire_at(&self, now_ms: u64) -> bool {
        let last = self.last_admitted_ms.load(Ordering::Acquire);
        if last != 0 && now_ms.saturating_sub(last) < self.interval_ms {
            return false;
        }
        self.last_admitted_ms
            .compare_exchange(last, now_ms.max(1), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
