//! Wraparound-safe monotonic time.
//!
//! The platform clock is a free-running 32-bit millisecond counter that wraps
//! every ~49.7 days. Comparing it directly (`now > target`) stalls or fires
//! early across the wrap, so every comparison here goes through
//! `wrapping_sub`:
//!
//! ```text
//! due  ⇔  now.wrapping_sub(start) >= period
//! ```
//!
//! This stays correct as long as a deadline is checked at least once per
//! `2^32 ms`, i.e. it tolerates a single wraparound between checks.

/// Monotonic milliseconds from the platform clock. Wraps at `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Millis(pub u32);

impl Millis {
    /// Milliseconds elapsed since `earlier`, correct across one wrap.
    #[inline]
    pub const fn elapsed_since(
        self,
        earlier: Millis,
    ) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Truncate a wider tick count (e.g. `embassy_time::Instant::as_millis`).
    #[inline]
    pub const fn from_u64(ms: u64) -> Self { Self(ms as u32) }
}

/// Platform millisecond clock.
pub trait Clock {
    fn now(&self) -> Millis;
}

/// A fixed-delay periodic deadline.
///
/// After firing, the next deadline is `now + period` measured from the moment
/// of [`rearm`](Self::rearm), not from the previous deadline. A slow caller
/// delays later ticks instead of bunching them up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: Millis,
    period: u32,
}

impl Deadline {
    /// Deadline that first fires `period` ms after `now`.
    pub const fn new(
        now: Millis,
        period: u32,
    ) -> Self {
        Self { start: now, period }
    }

    /// Deadline that is already due at `now`.
    pub const fn immediate(
        now: Millis,
        period: u32,
    ) -> Self {
        Self {
            start: Millis(now.0.wrapping_sub(period)),
            period,
        }
    }

    #[inline]
    pub const fn is_due(
        &self,
        now: Millis,
    ) -> bool {
        now.elapsed_since(self.start) >= self.period
    }

    /// Schedule the next deadline `period` ms after `now`.
    #[inline]
    pub fn rearm(
        &mut self,
        now: Millis,
    ) {
        self.start = now;
    }

    /// Milliseconds until due (0 when due).
    pub const fn remaining(
        &self,
        now: Millis,
    ) -> u32 {
        self.period.saturating_sub(now.elapsed_since(self.start))
    }

    #[inline]
    pub const fn period(&self) -> u32 { self.period }
}

/// Process uptime accumulated from wrapping clock deltas.
///
/// Unlike `now / 1000`, this keeps counting past the 32-bit wrap as long as
/// [`advance`](Self::advance) is called more often than once per wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UptimeCounter {
    last: Millis,
    total_ms: u64,
}

impl UptimeCounter {
    /// Start counting at `boot`. Uptime is measured from this instant.
    pub const fn new(boot: Millis) -> Self { Self { last: boot, total_ms: 0 } }

    pub fn advance(
        &mut self,
        now: Millis,
    ) {
        self.total_ms += u64::from(now.elapsed_since(self.last));
        self.last = now;
    }

    #[inline]
    pub const fn millis(&self) -> u64 { self.total_ms }

    #[inline]
    pub const fn seconds(&self) -> u64 { self.total_ms / 1000 }
}

// =============================================================================
// Unit Tests
// =============================================================================
