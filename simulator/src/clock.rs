//! Clocks for the simulator: a stepped one for headless runs and the
//! wall clock for the window.

use std::cell::Cell;
use std::time::Instant;

use panel_common::{Clock, Millis};

/// Simulated time, advanced explicitly by the run loop.
pub struct SimClock {
    now: Cell<u32>,
}

impl SimClock {
    pub fn new() -> Self { Self { now: Cell::new(0) } }

    pub fn advance(
        &self,
        ms: u32,
    ) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for SimClock {
    fn now(&self) -> Millis { Millis(self.now.get()) }
}

/// Milliseconds since the simulator started.
#[cfg_attr(not(feature = "window"), allow(dead_code))]
pub struct WallClock {
    start: Instant,
}

#[cfg_attr(not(feature = "window"), allow(dead_code))]
impl WallClock {
    pub fn new() -> Self { Self { start: Instant::now() } }
}

impl Clock for WallClock {
    fn now(&self) -> Millis { Millis::from_u64(self.start.elapsed().as_millis() as u64) }
}
