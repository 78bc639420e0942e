//! Fixed-step accumulator decoupling simulation from frame rate.

use std::time::Duration;

/// Accumulates frame time and reports how many whole steps to run.
#[derive(Debug, Clone)]
pub struct FixedStepLoop {
    step: Duration,
    max_frame_delta: Duration,
    accumulator: Duration,
}

impl FixedStepLoop {
    pub fn new(step_rate: u32, max_frame_delta: Duration) -> Self {
        Self {
            step: Duration::from_secs(1) / step_rate.max(1),
            max_frame_delta,
            accumulator: Duration::ZERO,
        }
    }

    /// 60 Hz with frame deltas clamped to 100 ms.
    pub fn sixty_hz() -> Self {
        Self::new(60, Duration::from_millis(100))
    }

    /// Seconds simulated per step.
    pub fn step_seconds(&self) -> f32 {
        self.step.as_secs_f32()
    }

    /// Add one frame's elapsed time and return the number of steps now due.
    pub fn advance(&mut self, frame_delta: Duration) -> u32 {
        self.accumulator += frame_delta.min(self.max_frame_delta);
        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    /// Run `step` for every due step, passing the step length in seconds.
    pub fn run<F: FnMut(f32)>(&mut self, frame_delta: Duration, mut step: F) -> u32 {
        let steps = self.advance(frame_delta);
        let dt = self.step_seconds();
        for _ in 0..steps {
            step(dt);
        }
        steps
    }

    /// Fraction of a step left over, for interpolating the next render.
    pub fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.step.as_secs_f32()
    }
}
