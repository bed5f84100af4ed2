//! Fixed-rate accumulators driving the simulation step and the broadcast tick.

use std::time::Duration;

/// Accumulates wall-clock time and releases it in fixed slices.
#[derive(Debug, Clone)]
pub struct FixedStep {
    interval: Duration,
    accumulator: Duration,
}

impl FixedStep {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn accumulate(&mut self, dt: Duration) {
        self.accumulator += dt;
    }

    /// Takes one interval out of the accumulator if enough time is pending.
    pub fn consume(&mut self) -> bool {
        if self.interval.is_zero() || self.accumulator < self.interval {
            return false;
        }
        self.accumulator -= self.interval;
        true
    }

    /// Time accumulated but not yet consumed
    pub fn pending(&self) -> Duration {
        self.accumulator
    }
}

/// The simulation step and the broadcast tick, fed from one frame clock
pub struct Scheduler {
    pub step: FixedStep,
    pub tick: FixedStep,
    max_frame_time: Duration,
}

impl Scheduler {
    pub fn new(step_interval: Duration, tick_interval: Duration, max_frame_time: Duration) -> Self {
        Self {
            step: FixedStep::new(step_interval),
            tick: FixedStep::new(tick_interval),
            max_frame_time,
        }
    }

    /// Feeds one frame delta to both accumulators.
    ///
    /// Deltas above the frame cap are clamped so a stalled process does not
    /// replay an unbounded backlog of steps.
    pub fn accumulate(&mut self, dt: Duration) {
        let dt = dt.min(self.max_frame_time);
        self.step.accumulate(dt);
        self.tick.accumulate(dt);
    }
}
