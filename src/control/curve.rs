//! Piecewise-linear fan curve.
//!
//! Maps the hottest sensor reading to a target fan speed:
//!
//! ```text
//!  speed %
//!   100 ┤                              ┌──────
//!    90 ┤                            ╱ │
//!    60 ┤                  ┌───────╱   │
//!    30 ┤        ┌───────╱           │
//!     0 ┼────────┘                     │
//!       └────────┬─────────┬───────────┬──────▶ °C
//!             warning   critical   emergency
//! ```
//!
//! Each band is closed on the left, so a reading exactly at `critical`
//! yields 60 % and exactly at `emergency` yields 100 %.

use crate::config::Thresholds;

/// Speed at the bottom of the warning band.
pub const WARNING_SPEED: f32 = 30.0;
/// Speed at the bottom of the critical band.
pub const CRITICAL_SPEED: f32 = 60.0;
/// Speed reached just below the emergency threshold.
pub const PRE_EMERGENCY_SPEED: f32 = 90.0;
/// Speed at and above the emergency threshold.
pub const EMERGENCY_SPEED: f32 = 100.0;

/// Fan curve over a validated set of [`Thresholds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanCurve {
    thresholds: Thresholds,
}

impl FanCurve {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Target fan speed (0–100 %) for the given temperature.
    pub fn fan_speed_for(&self, temperature_c: f32) -> f32 {
        let t = &self.thresholds;
        if temperature_c < t.warning_c {
            0.0
        } else if temperature_c < t.critical_c {
            lerp(temperature_c, t.warning_c, t.critical_c, WARNING_SPEED, CRITICAL_SPEED)
        } else if temperature_c < t.emergency_c {
            lerp(
                temperature_c,
                t.critical_c,
                t.emergency_c,
                CRITICAL_SPEED,
                PRE_EMERGENCY_SPEED,
            )
        } else {
            EMERGENCY_SPEED
        }
    }
}

fn lerp(x: f32, x0: f32, x1: f32, y0: f32, y1: f32) -> f32 {
    let ratio = (x - x0) / (x1 - x0);
    y0 + ratio * (y1 - y0)
}
