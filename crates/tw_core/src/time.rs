use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Fixed 60 Hz simulation step in integer microseconds (animation clock).
pub const FIXED_DT_US: u64 = 16_667;

/// Fixed-timestep clock: wall time is fed into an accumulator which is then
/// drained in `fixed_dt` slices by `should_step()`.
pub struct TimeState {
    pub fixed_dt: f64,
    pub max_frame_dt: f64,
    accumulator: f64,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self {
            fixed_dt: FIXED_DT_US as f64 / 1_000_000.0,
            max_frame_dt: 0.25,
            accumulator: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
        }
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.feed(elapsed);
    }

    /// Account `elapsed` seconds of wall time for this frame.
    pub fn feed(&mut self, elapsed: f64) {
        self.real_dt = if elapsed > self.max_frame_dt {
            log::warn!(
                "Frame took {:.1}ms, clamping to {:.0}ms",
                elapsed * 1000.0,
                self.max_frame_dt * 1000.0
            );
            self.max_frame_dt
        } else {
            elapsed
        };

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator < self.fixed_dt {
            return false;
        }
        self.accumulator -= self.fixed_dt;
        self.total_time += self.fixed_dt;
        self.fixed_step_count += 1;
        self.steps_this_frame += 1;
        true
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}
