//! Per-path suppression of repeated change events.

use lru::LruCache;
use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

/// Minimum spacing between two accepted events for the same path.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// Upper bound on remembered paths.
const LEDGER_CAPACITY: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// Source of "now" for the debouncer, swappable in tests.
pub trait Clock: Send {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Remembers when each path last had an accepted event.
pub struct Debouncer<C: Clock = SystemClock> {
    window: Duration,
    ledger: LruCache<PathBuf, Instant>,
    clock: C,
}

impl Debouncer<SystemClock> {
    pub fn new() -> Self {
        Debouncer::with_clock(DEBOUNCE_WINDOW, SystemClock)
    }
}

impl Default for Debouncer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Debouncer<C> {
    pub fn with_clock(window: Duration, clock: C) -> Self {
        Debouncer {
            window,
            ledger: LruCache::new(LEDGER_CAPACITY),
            clock,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decides whether an event for `path` arriving now should be handled.
    ///
    /// A rejected event leaves the stored timestamp alone, so a burst of
    /// events cannot keep extending the window.
    pub fn accept(&mut self, path: &Path) -> bool {
        let now = self.clock.now();

        if let Some(last) = self.ledger.get(path) {
            if now.saturating_duration_since(*last) < self.window {
                tracing::trace!("Debounced event for {}", path.display());
                return false;
            }
        }

        self.ledger.put(path.to_path_buf(), now);
        true
    }

    pub fn last_accepted(&mut self, path: &Path) -> Option<Instant> {
        self.ledger.get(path).copied()
    }
}
