//! Fixed-timestep loop ("Fix Your Timestep").
//!
//! Simulation runs at a fixed 60 Hz from an accumulator; the caller renders
//! once per frame with the returned interpolation alpha.

use std::time::Instant;
use tracing::warn;

/// Fixed simulation timestep: 60 Hz.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Frames longer than this are clamped, accepting slowdown over a spiral of
/// catch-up steps.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// What one frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTiming {
    /// Fixed steps run this frame.
    pub steps: u32,
    /// Interpolation factor in `[0, 1)` between the last two steps.
    pub alpha: f64,
}

pub struct GameLoop {
    previous_time: Instant,
    accumulator: f64,
    total_sim_time: f64,
    frame_count: u64,
    update_count: u64,
}

impl GameLoop {
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            accumulator: 0.0,
            total_sim_time: 0.0,
            frame_count: 0,
            update_count: 0,
        }
    }

    /// Measures the wall-clock time since the previous frame and runs
    /// [`advance`](Self::advance) with it.
    pub fn tick(&mut self, update_fn: impl FnMut(f64, f64)) -> FrameTiming {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous_time).as_secs_f64();
        self.previous_time = now;
        self.advance(frame_time, update_fn)
    }

    /// Runs as many fixed steps as `frame_time` (clamped) pays for.
    ///
    /// `update_fn(fixed_dt, total_sim_time)` is called zero or more times.
    pub fn advance(&mut self, frame_time: f64, mut update_fn: impl FnMut(f64, f64)) -> FrameTiming {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }

        self.accumulator += frame_time;

        let mut steps = 0;
        while self.accumulator >= FIXED_DT {
            update_fn(FIXED_DT, self.total_sim_time);
            self.total_sim_time += FIXED_DT;
            self.accumulator -= FIXED_DT;
            self.update_count += 1;
            steps += 1;
        }

        self.frame_count += 1;
        FrameTiming {
            steps,
            alpha: self.alpha(),
        }
    }

    /// Current interpolation alpha.
    pub fn alpha(&self) -> f64 {
        if self.accumulator > 0.0 {
            self.accumulator / FIXED_DT
        } else {
            0.0
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Total simulated time in seconds.
    pub fn total_sim_time(&self) -> f64 {
        self.total_sim_time
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}
