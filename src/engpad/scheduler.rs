//! Debounced save scheduling.
//!
//! Provides:
//! - [`DelayPolicy`] - size-adaptive debounce delay
//! - [`Timers`] - one cancellable timer per document
//!
//! Each edit re-arms the document's timer, so a burst of keystrokes produces
//! a single save once typing pauses. Larger documents wait longer because
//! every save serializes the whole content.
//!
//! Timers are spawned tasks tagged with a generation number. Re-arming or
//! cancelling aborts the previous task; a task that wakes up must still call
//! [`Timers::take_if_current`] before acting, which fails for any generation
//! that has been superseded.

use crate::config::NotepadConfig;
use crate::model::DocumentId;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Documents below this many characters use the short delay.
pub const MEDIUM_THRESHOLD: usize = 10_000;
/// Documents below this many characters use the medium delay.
pub const LONG_THRESHOLD: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    pub short: Duration,
    pub medium: Duration,
    pub long: Duration,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::from_config(&NotepadConfig::default())
    }
}

impl DelayPolicy {
    pub fn from_config(config: &NotepadConfig) -> Self {
        Self {
            short: Duration::from_millis(config.short_delay_ms),
            medium: Duration::from_millis(config.medium_delay_ms),
            long: Duration::from_millis(config.long_delay_ms),
        }
    }

    /// Debounce delay for content of `char_len` characters.
    pub fn delay_for(&self, char_len: usize) -> Duration {
        if char_len < MEDIUM_THRESHOLD {
            self.short
        } else if char_len < LONG_THRESHOLD {
            self.medium
        } else {
            self.long
        }
    }
}

#[derive(Debug)]
struct Armed {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Pending debounce timers, at most one per document.
#[derive(Debug, Default)]
pub struct Timers {
    armed: HashMap<DocumentId, Armed>,
    next_generation: u64,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending timer for `id` with one that runs `on_fire` after
    /// `delay`. `on_fire` receives the generation it must present to
    /// [`Timers::take_if_current`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F, Fut>(&mut self, id: DocumentId, delay: Duration, on_fire: F)
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel(id);
        self.next_generation += 1;
        let generation = self.next_generation;
        let fire = on_fire(generation);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire.await;
        });
        tracing::trace!(doc = %id, generation, ?delay, "armed save timer");
        self.armed.insert(id, Armed { generation, handle });
    }

    /// Disarm the timer for `id` if `generation` is still the current one.
    /// Returns false for a superseded or cancelled timer, which must not act.
    pub fn take_if_current(&mut self, id: DocumentId, generation: u64) -> bool {
        match self.armed.get(&id) {
            Some(armed) if armed.generation == generation => {
                self.armed.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Abort the pending timer for `id`. Returns whether one was pending.
    pub fn cancel(&mut self, id: DocumentId) -> bool {
        match self.armed.remove(&id) {
            Some(armed) => {
                armed.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, armed) in self.armed.drain() {
            armed.handle.abort();
        }
    }

    pub fn is_armed(&self, id: DocumentId) -> bool {
        self.armed.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const DOC: DocumentId = DocumentId::new(1);

    type Fired = Arc<Mutex<Vec<u64>>>;

    fn arm(timers: &Arc<Mutex<Timers>>, fired: &Fired, delay_ms: u64) {
        let shared = timers.clone();
        let fired = fired.clone();
        timers
            .lock()
            .unwrap()
            .arm(DOC, Duration::from_millis(delay_ms), move |generation| async move {
                if shared.lock().unwrap().take_if_current(DOC, generation) {
                    fired.lock().unwrap().push(generation);
                }
            });
    }

    #[test]
    fn delay_grows_with_size() {
        let policy = DelayPolicy {
            short: Duration::from_millis(10),
            medium: Duration::from_millis(20),
            long: Duration::from_millis(30),
        };
        assert_eq!(policy.delay_for(0), policy.short);
        assert_eq!(policy.delay_for(MEDIUM_THRESHOLD - 1), policy.short);
        assert_eq!(policy.delay_for(MEDIUM_THRESHOLD), policy.medium);
        assert_eq!(policy.delay_for(LONG_THRESHOLD - 1), policy.medium);
        assert_eq!(policy.delay_for(LONG_THRESHOLD), policy.long);
    }

    #[test]
    fn default_policy_follows_default_config() {
        let policy = DelayPolicy::default();
        assert_eq!(policy.short, Duration::from_secs(1));
        assert!(policy.short <= policy.medium && policy.medium <= policy.long);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let timers = Arc::new(Mutex::new(Timers::new()));
        let fired: Fired = Arc::default();
        arm(&timers, &fired, 100);
        assert!(timers.lock().unwrap().is_armed(DOC));

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert!(fired.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.lock().unwrap().len(), 1);
        assert!(timers.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_debounces() {
        let timers = Arc::new(Mutex::new(Timers::new()));
        let fired: Fired = Arc::default();

        for _ in 0..5 {
            arm(&timers, &fired, 100);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(fired.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(*fired.lock().unwrap(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let timers = Arc::new(Mutex::new(Timers::new()));
        let fired: Fired = Arc::default();
        arm(&timers, &fired, 100);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(timers.lock().unwrap().cancel(DOC));
        assert!(!timers.lock().unwrap().cancel(DOC));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(fired.lock().unwrap().is_empty());
    }

    #[test]
    fn stale_generation_is_refused() {
        let mut timers = Timers::new();
        assert!(!timers.take_if_current(DOC, 1));
    }
}
