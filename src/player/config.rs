use std::time::Duration;

use crate::error::{Error, Result};
use crate::utils::timing::secs_to_duration;

/// Default duration of the glide before and after an action.
pub const DEFAULT_GLIDE: Duration = Duration::from_millis(50);

/// Settings for one [`Player`](super::Player). Passed at construction, replaced between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// Divides every step's `delay_before`. Must be finite and > 0.
    pub speed_multiplier: f64,
    /// Seconds to wait between two passes over the steps (not after the last one).
    pub inter_iteration_delay: f64,
    /// Duration of the glide to a target and back. Not affected by the speed.
    pub glide: Duration,
    /// Emergency-stop zone checked before every pointer operation.
    pub safety: SafetyZone,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            inter_iteration_delay: 0.0,
            glide: DEFAULT_GLIDE,
            safety: SafetyZone::default(),
        }
    }
}

impl PlaybackConfig {
    pub fn with_speed(mut self, speed_multiplier: f64) -> Self {
        self.speed_multiplier = speed_multiplier;
        self
    }

    pub fn with_inter_iteration_delay(mut self, secs: f64) -> Self {
        self.inter_iteration_delay = secs;
        self
    }

    pub fn with_safety(mut self, safety: SafetyZone) -> Self {
        self.safety = safety;
        self
    }

    /// Reject settings the playback loop cannot honour.
    pub fn validate(&self) -> Result<()> {
        if !self.speed_multiplier.is_finite() || self.speed_multiplier <= 0.0 {
            return Err(Error::Config(format!(
                "speed multiplier must be a positive number, got {}",
                self.speed_multiplier
            )));
        }
        if !self.inter_iteration_delay.is_finite() || self.inter_iteration_delay < 0.0 {
            return Err(Error::Config(format!(
                "inter-iteration delay must be >= 0 seconds, got {}",
                self.inter_iteration_delay
            )));
        }
        if self.safety.margin < 0 {
            return Err(Error::Config(format!(
                "safety margin must be >= 0, got {}",
                self.safety.margin
            )));
        }
        Ok(())
    }

    /// Wait before a step whose recorded delay is `delay_before` seconds.
    pub fn scaled_delay(&self, delay_before: f64) -> Duration {
        secs_to_duration(delay_before / self.speed_multiplier)
    }

    pub fn inter_iteration(&self) -> Duration {
        secs_to_duration(self.inter_iteration_delay)
    }
}

/// A screen corner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Corners of the main display that abort playback when the pointer enters them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyZone {
    pub enabled: bool,
    /// Size of the square zone in pixels beyond the corner pixel itself.
    pub margin: i32,
    pub corners: Vec<Corner>,
}

impl Default for SafetyZone {
    fn default() -> Self {
        Self {
            enabled: true,
            margin: 0,
            corners: vec![Corner::TopLeft],
        }
    }
}

impl SafetyZone {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// True if any configured corner needs the display size to be located.
    pub fn needs_display_size(&self) -> bool {
        self.enabled && self.corners.iter().any(|c| *c != Corner::TopLeft)
    }

    /// Is `pos` inside the zone? `display` is `(width, height)` of the main display.
    pub fn contains(&self, pos: (i32, i32), display: Option<(i32, i32)>) -> bool {
        if !self.enabled {
            return false;
        }
        let (x, y) = pos;
        let m = self.margin;
        self.corners.iter().any(|corner| match (corner, display) {
            (Corner::TopLeft, _) => x <= m && y <= m,
            (Corner::TopRight, Some((w, _))) => x >= w - 1 - m && y <= m,
            (Corner::BottomLeft, Some((_, h))) => x <= m && y >= h - 1 - m,
            (Corner::BottomRight, Some((w, h))) => x >= w - 1 - m && y >= h - 1 - m,
            (_, None) => false,
        })
    }
}
