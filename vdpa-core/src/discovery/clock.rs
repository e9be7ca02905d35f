//! Time source for the discovery poll loop.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

/// Source of time the poll loop waits on.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock; `sleep` blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

type SleepHook<'a> = Box<dyn FnMut(Duration) + 'a>;

/// Virtual clock: `sleep` advances time instantly.
///
/// An optional hook runs after every sleep with the total elapsed time, which
/// lets tests change the world at a given point of the poll.
pub struct VirtualClock<'a> {
    start: Instant,
    elapsed: Cell<Duration>,
    on_sleep: RefCell<Option<SleepHook<'a>>>,
}

impl<'a> VirtualClock<'a> {
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Cell::new(Duration::ZERO), on_sleep: RefCell::new(None) }
    }

    pub fn with_hook(hook: impl FnMut(Duration) + 'a) -> Self {
        let clock = Self::new();
        *clock.on_sleep.borrow_mut() = Some(Box::new(hook));
        clock
    }

    /// Total virtual time slept so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Default for VirtualClock<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock<'_> {
    fn now(&self) -> Instant {
        self.start + self.elapsed.get()
    }

    fn sleep(&self, duration: Duration) {
        let elapsed = self.elapsed.get() + duration;
        self.elapsed.set(elapsed);
        if let Some(hook) = self.on_sleep.borrow_mut().as_mut() {
            hook(elapsed);
        }
    }
}
