//! Frame time for the Kestrel runtime
//!
//! The host loop feeds raw frame deltas in; the scheduler and systems read the
//! clamped, scaled delta back out.

use serde::{Deserialize, Serialize};

/// Configuration for frame time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// How many in-game seconds pass per real second
    pub time_scale: f32,
    /// Maximum delta time to prevent a spiral of death after a stall
    pub max_delta_time: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_time: 0.25,
        }
    }
}

impl TimeConfig {
    /// Copy with unusable values replaced. A negative or non-finite time scale
    /// becomes 0.0, a negative max delta becomes 0.0 and a NaN max delta falls
    /// back to the default.
    pub fn sanitized(&self) -> Self {
        let time_scale = if self.time_scale.is_finite() && self.time_scale >= 0.0 {
            self.time_scale
        } else {
            0.0
        };
        let max_delta_time = if self.max_delta_time.is_nan() {
            Self::default().max_delta_time
        } else {
            self.max_delta_time.max(0.0)
        };
        Self {
            time_scale,
            max_delta_time,
        }
    }
}

/// Game time tracking
#[derive(Debug, Clone, Default)]
pub struct GameTime {
    /// Configuration
    pub config: TimeConfig,
    /// Time since the first frame in seconds
    pub total_time: f64,
    /// Delta time for this frame (clamped and scaled, never negative)
    pub delta_time: f32,
    /// Clamped but unscaled delta time
    pub unscaled_delta_time: f32,
    /// Frame counter
    pub frame_count: u64,
    /// Whether the game is paused
    pub paused: bool,
}

impl GameTime {
    /// Create a new game time with custom config
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config: config.sanitized(),
            ..Default::default()
        }
    }

    /// Update the game time with the raw delta from the previous frame.
    /// The resulting delta is never negative.
    pub fn update(&mut self, raw_delta: f32) {
        self.config = self.config.sanitized();
        let raw_delta = if raw_delta.is_nan() { 0.0 } else { raw_delta };
        self.unscaled_delta_time = raw_delta.clamp(0.0, self.config.max_delta_time);
        self.frame_count += 1;

        if self.paused {
            self.delta_time = 0.0;
            return;
        }

        self.delta_time = self.unscaled_delta_time * self.config.time_scale;
        self.total_time += self.delta_time as f64;
    }

    /// Pause the game
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume the game
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Set the time scale (0.0 = frozen, 1.0 = normal, 2.0 = double speed)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale.max(0.0);
    }
}
