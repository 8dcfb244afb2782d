//! Cooling fan driver.
//!
//! Tracks a commanded `target` speed and the `current` speed, which
//! moves toward the target by at most `slew` percentage points per call.
//! Speeds are percentages in 0..=100.
//!
//! ## Safety contract
//!
//! Out-of-range requests are rejected and leave the fan untouched.  The
//! thermal supervisor decides when to shut the loop down; this driver is
//! a dumb actuator.

use log::info;
use serde::Serialize;

use crate::Label;
use crate::error::ActuatorError;

pub const MIN_SPEED: f32 = 0.0;
pub const MAX_SPEED: f32 = 100.0;

/// A new target that moved by more than the fan's log threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanAdjustment {
    /// Current speed when the target was commanded.
    pub from: f32,
    /// Commanded target; with a slew limit the fan reaches it over several calls.
    pub to: f32,
}

/// Point-in-time view of one fan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FanStatus {
    pub fan_id: Label,
    pub current_speed: f32,
    pub target_speed: f32,
    pub is_active: bool,
    pub speed_adjustments: u32,
}

pub struct FanDriver {
    id: Label,
    current: f32,
    target: f32,
    adjustments: u32,
    slew: f32,
    log_threshold: f32,
}

impl FanDriver {
    /// A stopped fan that reaches any target in one step and logs changes
    /// above 5 points.
    pub fn new(id: Label) -> Self {
        Self::with_limits(id, MAX_SPEED, 5.0)
    }

    pub fn with_limits(id: Label, slew_per_step: f32, log_threshold: f32) -> Self {
        Self {
            id,
            current: 0.0,
            target: 0.0,
            adjustments: 0,
            slew: slew_per_step,
            log_threshold,
        }
    }

    /// Command a new target and step `current` toward it.
    ///
    /// Returns `Some` when the new target differs from the previous one by
    /// more than the log threshold.  The change is logged and counted once
    /// per commanded target, however many calls `current` takes to get
    /// there.
    pub fn set_speed(&mut self, speed: f32) -> Result<Option<FanAdjustment>, ActuatorError> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(ActuatorError::SpeedOutOfRange(speed));
        }

        let adjustment = if (speed - self.target).abs() > self.log_threshold {
            self.adjustments = self.adjustments.saturating_add(1);
            info!(
                "FAN | {}: adjusting speed {:.1}% -> {:.1}%",
                self.id, self.current, speed
            );
            Some(FanAdjustment {
                from: self.current,
                to: speed,
            })
        } else {
            None
        };

        self.target = speed;
        let gap = self.target - self.current;
        self.current += gap.clamp(-self.slew, self.slew);
        Ok(adjustment)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn current_speed(&self) -> f32 {
        self.current
    }

    pub fn target_speed(&self) -> f32 {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.current > 0.0
    }

    pub fn speed_adjustments(&self) -> u32 {
        self.adjustments
    }

    pub fn status(&self) -> FanStatus {
        FanStatus {
            fan_id: self.id.clone(),
            current_speed: self.current,
            target_speed: self.target,
            is_active: self.is_active(),
            speed_adjustments: self.adjustments,
        }
    }
}
