use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Play once and stop at the end (or the start when reversed).
    Once,
    #[default]
    Loop,
    PingPong,
}

/// Caller-side clock for one playing clip.
///
/// Sampling itself only clamps inside a track. Whether time past the clip
/// end wraps, bounces or stops is decided here, before the time reaches the
/// animator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    pub time: f32,
    pub time_scale: f32,
    pub loop_mode: LoopMode,
    pub paused: bool,
    /// Unwrapped time used by `PingPong` to know which direction it is in.
    elapsed: f32,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(LoopMode::Loop)
    }
}

impl Playback {
    #[must_use]
    pub fn new(loop_mode: LoopMode) -> Self {
        Self {
            time: 0.0,
            time_scale: 1.0,
            loop_mode,
            paused: false,
            elapsed: 0.0,
        }
    }

    /// Jumps to `time` (seconds).
    pub fn seek(&mut self, time: f32) {
        self.time = time;
        self.elapsed = time;
    }

    /// Advances by `dt` seconds and returns the clip-local sample time.
    pub fn advance(&mut self, dt: f32, duration: f32) -> f32 {
        if self.paused || duration <= 0.0 || !duration.is_finite() {
            return self.time;
        }

        let step = dt * self.time_scale;
        self.elapsed += step;

        match self.loop_mode {
            LoopMode::Once => {
                let t = self.time + step;
                if t >= duration {
                    self.time = duration;
                    self.paused = true;
                } else if t < 0.0 {
                    self.time = 0.0;
                    self.paused = true;
                } else {
                    self.time = t;
                }
            }
            LoopMode::Loop => {
                // rem_euclid rounds up to `duration` for tiny negative inputs
                let t = (self.time + step).rem_euclid(duration);
                self.time = if t >= duration { duration.next_down() } else { t };
            }
            LoopMode::PingPong => {
                let period = duration * 2.0;
                let t = self.elapsed.rem_euclid(period);
                self.time = if t > duration { period - t } else { t };
            }
        }

        self.time
    }
}
