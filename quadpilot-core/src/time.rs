//! Time Source Abstraction for the Control Loop
//!
//! Guidance integrates climb rates over elapsed time and the controller
//! integrates/differentiates errors over the tick interval. Both read the same
//! injected [`TimeSource`] instead of the wall clock, which keeps flight logic
//! deterministic under test.
//!
//! ## Sharing one clock
//!
//! `TimeSource` is implemented for `&T` (and `Arc<T>` with `std`), so a
//! single clock instance can be handed to every component:
//!
//! ```rust
//! use quadpilot_core::time::{MockTimeSource, TimeSource};
//!
//! let clock = MockTimeSource::new(0);
//! let shared = &clock;
//! clock.advance_ms(10);
//! assert_eq!(shared.now(), 10_000);
//! ```
//!
//! ## Common Implementations
//!
//! - `MonotonicClock`: `std::time::Instant` based, microseconds since creation
//! - `MockTimeSource`: controllable time for testing and replay

use core::cell::Cell;

/// Timestamp in microseconds since an implementation-defined epoch
pub type Timestamp = u64;

/// Microseconds per second
pub const MICROS_PER_SECOND: f32 = 1_000_000.0;

/// Source of time for the pipeline
///
/// ## Implementation Requirements
///
/// - `now()` should be monotonic; a step backwards is treated as zero elapsed time
/// - Precision should be documented for each implementation
pub trait TimeSource {
    /// Current timestamp in microseconds
    fn now(&self) -> Timestamp;

    /// Whether this source follows wall clock time (may jump) rather than a monotonic counter
    fn is_wall_clock(&self) -> bool;

    /// Smallest interval this source can resolve, in microseconds
    fn precision_us(&self) -> u32;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }

    fn precision_us(&self) -> u32 {
        (**self).precision_us()
    }
}

#[cfg(feature = "std")]
impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }

    fn precision_us(&self) -> u32 {
        (**self).precision_us()
    }
}

/// Monotonic clock backed by `std::time::Instant`
///
/// Clones share the same origin, so every component sees the same timeline.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    /// Start a clock at zero
    pub fn new() -> Self {
        Self { origin: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_micros() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }

    fn precision_us(&self) -> u32 {
        1
    }
}

/// Controllable time source for tests and log replay
///
/// Interior mutability lets a test advance the clock while components hold
/// `&MockTimeSource`.
#[derive(Debug, Default)]
pub struct MockTimeSource {
    now_us: Cell<Timestamp>,
}

impl MockTimeSource {
    /// Create a clock reading `start_us`
    pub fn new(start_us: Timestamp) -> Self {
        Self { now_us: Cell::new(start_us) }
    }

    /// Jump to an absolute timestamp
    pub fn set(&self, timestamp: Timestamp) {
        self.now_us.set(timestamp);
    }

    /// Advance by `us` microseconds
    pub fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get().saturating_add(us));
    }

    /// Advance by `ms` milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms.saturating_mul(1_000));
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.now_us.get()
    }

    fn is_wall_clock(&self) -> bool {
        false
    }

    fn precision_us(&self) -> u32 {
        1
    }
}

/// Measures the interval between successive calls
///
/// The first lap of a timer created with [`DeltaTimer::new`] reports zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaTimer {
    last: Option<Timestamp>,
}

impl DeltaTimer {
    /// Timer with no reference point yet
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Seconds since the previous lap; clock steps backwards count as zero
    pub fn lap(&mut self, now: Timestamp) -> f32 {
        let elapsed = match self.last {
            Some(last) => now.saturating_sub(last),
            None => 0,
        };
        self.last = Some(now);
        elapsed as f32 / MICROS_PER_SECOND
    }

    /// Forget the reference point
    pub fn reset(&mut self) {
        self.last = None;
    }
}
