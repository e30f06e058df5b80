use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Monotonically incrementing counter, bumped on every phase transition.
/// A timer callback captures the token at schedule time and the handler
/// re-checks it unconditionally on fire — "the only safe guard against
/// stale timer callbacks" (spec.md §4.1).
pub type PhaseToken = u64;

/// Owns every scheduled task for one room. `clear_all` is called at every
/// phase boundary before new timers are installed (spec.md invariant:
/// "all timers for previous phases are cancelled before a new phase is
/// entered"). Dropping the registry cancels everything too, so a room
/// actor that exits never leaks a sleeping task.
#[derive(Default)]
pub struct TimerRegistry {
    handles: Vec<JoinHandle<()>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aborts every outstanding scheduled task.
    pub fn clear_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    /// Schedules a single message to be sent after `delay`.
    pub fn schedule_once<T>(&mut self, delay: Duration, tx: UnboundedSender<T>, msg: T)
    where
        T: Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(msg);
        });
        self.handles.push(handle);
    }

    /// Schedules a repeating message every `interval`, e.g. hot-button's
    /// character-reveal ticks. Stops when the receiver is dropped or the
    /// registry is cleared.
    pub fn schedule_periodic<T>(&mut self, interval: Duration, tx: UnboundedSender<T>, msg: T)
    where
        T: Clone + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                if tx.send(msg.clone()).is_err() {
                    break;
                }
            }
        });
        self.handles.push(handle);
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.clear_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test(flavor = "multi_thread")]
    async fn schedule_once_fires_after_delay() {
        let (tx, mut rx) = unbounded_channel();
        let mut registry = TimerRegistry::new();
        registry.schedule_once(Duration::from_millis(5), tx, "fired".to_string());
        let msg = rx.recv().await.expect("timer fires");
        assert_eq!(msg, "fired");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn clear_all_prevents_late_fire() {
        let (tx, mut rx) = unbounded_channel::<&'static str>();
        let mut registry = TimerRegistry::new();
        registry.schedule_once(Duration::from_millis(50), tx, "stale");
        registry.clear_all();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(rx.try_recv().is_err());
    }
}
