use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Absolute server timestamp in milliseconds since the epoch, as stamped
/// on every broadcast (`serverTime`) and used for `timerEnd` deadlines.
pub type ServerTime = u64;

/// Wall-clock source for the room actor. A trait so tests can supply a
/// fixed or stepped clock instead of racing real time.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> ServerTime;
}

/// Production clock backed by `SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> ServerTime {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is after the epoch")
            .as_millis() as u64
    }
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedClock(pub std::sync::Arc<std::sync::atomic::AtomicU64>);

#[cfg(test)]
impl FixedClock {
    pub fn new(start: ServerTime) -> Self {
        Self(std::sync::Arc::new(std::sync::atomic::AtomicU64::new(start)))
    }
    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now_ms(&self) -> ServerTime {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonically_plausible() {
        let clock = SystemClock;
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }

    #[test]
    fn fixed_clock_advances_on_demand() {
        let clock = FixedClock::new(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        clock.advance(500);
        assert_eq!(clock.now_ms(), 1_500);
    }
}
