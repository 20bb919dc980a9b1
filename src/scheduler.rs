//! Fixed-timestep accumulator
//!
//! Turns variable frame deltas into a whole number of fixed simulation steps.
//! Deltas are clamped so a long stall (tab in the background, debugger pause)
//! costs at most a quarter second of catch-up instead of a burst of hundreds
//! of steps. The fractional remainder carries into the next frame.

use crate::consts::{MAX_FRAME_DT, SIM_DT};

#[derive(Debug, Clone)]
pub struct FixedStepScheduler {
    step: f64,
    max_frame: f64,
    accumulator: f64,
    total_steps: u64,
}

impl Default for FixedStepScheduler {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_FRAME_DT)
    }
}

impl FixedStepScheduler {
    pub fn new(step: f32, max_frame: f32) -> Self {
        Self {
            step: step as f64,
            max_frame: max_frame as f64,
            accumulator: 0.0,
            total_steps: 0,
        }
    }

    /// Fixed step length in seconds
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Unconsumed time carried to the next frame
    pub fn remainder(&self) -> f64 {
        self.accumulator
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Add a frame delta (seconds); returns how many fixed steps are due
    pub fn accumulate(&mut self, frame_dt: f64) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, self.max_frame)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut steps = 0;
        // Small epsilon so 1/60 s frames do not strand a step to rounding
        while self.accumulator + 1e-7 >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        if self.accumulator < 0.0 {
            self.accumulator = 0.0;
        }
        self.total_steps += steps as u64;
        steps
    }

    /// Drop any carried remainder (level transitions)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
