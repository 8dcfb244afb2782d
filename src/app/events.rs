//! Outbound control-loop events and the status snapshot.
//!
//! The [`ThermalService`](super::service::ThermalService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.

use heapless::Vec;
use serde::Serialize;

use crate::Label;
use crate::drivers::MAX_FANS;
use crate::drivers::fan::FanStatus;
use crate::error::Error;
use crate::sensors::MAX_SENSORS;
use crate::sensors::thermal::SensorStatus;

/// Why the control loop left `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// `stop()` was called.
    Requested,
    /// The hottest sensor went above the emergency threshold.
    EmergencyShutdown,
}

/// Structured events emitted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ThermalEvent {
    /// The loop entered `Running`.
    Started { sensors: usize, fans: usize },

    /// The loop left `Running`.
    Stopped(StopReason),

    /// A fan's speed changed by more than its log threshold.
    FanAdjusted { fan_id: Label, from: f32, to: f32 },

    /// Hottest reading is above the critical threshold.
    ThermalWarning { max_c: f32 },

    /// Hottest reading is above the emergency threshold; the loop stops.
    EmergencyShutdown { max_c: f32 },

    /// A tick failed; the loop carries on at the next interval.
    TickFailed(Error),

    /// Periodic status report.  The control loop does not emit this;
    /// callers emit it at their own cadence from
    /// [`ThermalController::status`](crate::controller::ThermalController::status).
    Telemetry(StatusSnapshot),
}

/// Read-only aggregate of every sensor and fan plus event counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub is_running: bool,
    pub sensors: usize,
    pub fans: usize,
    pub max_temperature: f32,
    pub thermal_events: u32,
    pub emergency_shutdowns: u32,
    pub ticks: u64,
    pub failed_ticks: u64,
    pub sensor_data: Vec<SensorStatus, MAX_SENSORS>,
    pub fan_data: Vec<FanStatus, MAX_FANS>,
}
