//! Frame timing.

use std::time::{Duration, Instant};

use tracing::debug;

/// How often the frame rate is reported.
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Measures per-tick delta time and reports frames per second.
#[derive(Debug)]
pub struct FrameTimer {
    start: Instant,
    last_tick: Instant,
    window_start: Instant,
    frames_in_window: u32,
    last_fps: f32,
}

impl FrameTimer {
    /// Create a new timer, starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            window_start: now,
            frames_in_window: 0,
            last_fps: 0.0,
        }
    }

    /// Total elapsed time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Advance one frame and return the delta in seconds.
    ///
    /// Once per second the frame rate is recomputed and logged at `debug`.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.tick_at(now)
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.frames_in_window += 1;

        let window = now.saturating_duration_since(self.window_start);
        if window >= REPORT_INTERVAL {
            self.last_fps = self.frames_in_window as f32 / window.as_secs_f32();
            debug!(
                "{:.1} fps ({:.2} ms/frame)",
                self.last_fps,
                1000.0 / self.last_fps
            );
            self.window_start = now;
            self.frames_in_window = 0;
        }

        delta.as_secs_f32()
    }

    /// Frames per second measured over the last completed report window.
    pub fn fps(&self) -> f32 {
        self.last_fps
    }

    /// Reset all counters to the current time.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
