//! Fixed-step simulation clock.

use crate::error::{KernelError, KernelResult};

/// Monotonic tick counter with a fixed step.
///
/// The clock only moves forward, one tick per [`SimClock::advance`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    tick: u64,
    dt: f64,
    total_ticks: u64,
}

impl SimClock {
    pub fn new(dt: f64, total_ticks: u64) -> KernelResult<Self> {
        if !dt.is_finite() {
            return Err(KernelError::NonFinite {
                what: "dt",
                value: dt,
            });
        }
        if dt <= 0.0 {
            return Err(KernelError::InvalidArg {
                what: "dt must be positive",
            });
        }
        Ok(Self {
            tick: 0,
            dt,
            total_ticks,
        })
    }

    /// Number of ticks needed to cover `total_time` with step `dt`.
    ///
    /// Rounds up so the final partial step still executes; a tiny epsilon
    /// keeps exact multiples (10.0 / 0.1) from gaining a tick to rounding.
    pub fn ticks_for(total_time: f64, dt: f64) -> KernelResult<u64> {
        if !total_time.is_finite() || total_time < 0.0 {
            return Err(KernelError::InvalidArg {
                what: "total time must be finite and non-negative",
            });
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(KernelError::InvalidArg {
                what: "dt must be positive",
            });
        }
        let raw = total_time / dt;
        Ok((raw - 1e-9).ceil().max(0.0) as u64)
    }

    /// Current (not yet completed) tick index.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Simulation time at the start of the current tick.
    pub fn time(&self) -> f64 {
        self.tick as f64 * self.dt
    }

    pub fn is_finished(&self) -> bool {
        self.tick >= self.total_ticks
    }

    /// Move to the next tick. Returns false once the run is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.tick += 1;
        true
    }
}
