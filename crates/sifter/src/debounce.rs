//! Debouncing of rapidly changing input.
//!
//! A [`Debouncer`] holds at most one pending value and the instant it
//! becomes due. Scheduling a new value replaces the pending one and restarts
//! the delay, so only a value left untouched for the full delay is ever
//! released. Nothing here spawns timers: the owner polls with the current
//! time, which comes from a [`Clock`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the engine.
///
/// ```
/// use std::time::Duration;
/// use sifter::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// let start = clock.now();
/// handle.advance(Duration::from_millis(250));
/// assert_eq!(clock.now() - start, Duration::from_millis(250));
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        ManualClock {
            origin: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Trailing-edge debouncer for a single value.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    /// Creates an idle debouncer.
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: None,
        }
    }

    /// Replaces any pending value and restarts the delay from `now`.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.delay,
        });
    }

    /// Releases the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if pending.deadline <= now => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Releases the pending value immediately.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    /// Drops the pending value without releasing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// The pending value, if any.
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.value)
    }

    /// When the pending value becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Returns `true` while a value waits to be released.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn releases_after_delay() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(DELAY);
        d.schedule("bo", clock.now());

        clock.advance(Duration::from_millis(299));
        assert_eq!(d.poll(clock.now()), None);

        clock.advance(Duration::from_millis(1));
        assert_eq!(d.poll(clock.now()), Some("bo"));
        assert!(!d.is_pending());
        assert_eq!(d.poll(clock.now()), None);
    }

    #[test]
    fn new_value_restarts_delay() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(DELAY);
        d.schedule("b", clock.now());

        clock.advance(Duration::from_millis(200));
        d.schedule("bo", clock.now());

        clock.advance(Duration::from_millis(200));
        // 400ms after "b" but only 200ms after "bo"
        assert_eq!(d.poll(clock.now()), None);
        assert_eq!(d.pending(), Some(&"bo"));

        clock.advance(Duration::from_millis(100));
        assert_eq!(d.poll(clock.now()), Some("bo"));
    }

    #[test]
    fn deadline_tracks_latest_schedule() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(DELAY);
        assert_eq!(d.deadline(), None);
        let start = clock.now();
        d.schedule(1, start);
        assert_eq!(d.deadline(), Some(start + DELAY));
    }

    #[test]
    fn flush_and_cancel() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(DELAY);
        d.schedule(1, clock.now());
        assert_eq!(d.flush(), Some(1));
        assert_eq!(d.flush(), None);

        d.schedule(2, clock.now());
        d.cancel();
        clock.advance(DELAY);
        assert_eq!(d.poll(clock.now()), None);
    }

    #[test]
    fn zero_delay_is_due_immediately() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(Duration::ZERO);
        d.schedule("x", clock.now());
        assert_eq!(d.poll(clock.now()), Some("x"));
    }
}
