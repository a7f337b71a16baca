//! Microsecond clocks driving [`Simulator::update`](crate::systems::simulator::Simulator::update).

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Free-running clock reporting microseconds since it started.
pub trait Clock {
    fn micros(&self) -> u64;
}

/// Wall clock backed by [`Instant`]. Starts counting on construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

/// Clock advanced by hand. Clones share the same time, so a host can keep
/// one copy and hand the other to the simulator.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, micros: u64) {
        self.micros.set(micros);
    }

    pub fn advance(&self, micros: u64) {
        self.micros.set(self.micros.get() + micros);
    }

    pub fn advance_secs(&self, secs: f32) {
        self.advance((f64::from(secs) * 1_000_000.0).round() as u64);
    }
}

impl Clock for ManualClock {
    fn micros(&self) -> u64 {
        self.micros.get()
    }
}
