//! Unified error types for the thermal controller.
//!
//! A single `Error` enum that every subsystem converts into, so the control
//! loop can log and emit any per-tick failure the same way.  All variants
//! are `Copy` so they can ride inside [`ThermalEvent`](crate::app::events::ThermalEvent)
//! without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// A temperature source could not be read.
    Sensor(SensorError),
    /// A fan command was rejected.
    Actuator(ActuatorError),
    /// Configuration is invalid or a registration limit was hit.
    Config(&'static str),
    /// A start/stop/registration request does not fit the loop state.
    Lifecycle(LifecycleError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Lifecycle(e) => write!(f, "lifecycle: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The source had no value to give (disconnected, exhausted, ...).
    ReadFailed,
    /// The source returned NaN or infinity.
    NotFinite,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed"),
            Self::NotFinite => write!(f, "reading is not finite"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorError {
    /// Requested fan speed is outside 0..=100 %.
    SpeedOutOfRange(f32),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpeedOutOfRange(speed) => write!(f, "invalid fan speed {speed}%"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Lifecycle errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// Sensors and fans can only be registered while the loop is stopped.
    Running,
    /// A previous `stop()` timed out and the loop thread has not exited yet.
    StopPending,
    /// The loop thread panicked; its sensors and fans are gone.
    WorkerLost,
    /// The OS refused to spawn the loop thread.
    SpawnFailed,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "control loop is running"),
            Self::StopPending => write!(f, "control loop has not exited yet"),
            Self::WorkerLost => write!(f, "control loop thread panicked"),
            Self::SpawnFailed => write!(f, "control loop thread could not be spawned"),
        }
    }
}

impl From<LifecycleError> for Error {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

// ---------------------------------------------------------------------------
// Thermal faults
// ---------------------------------------------------------------------------

/// Thermal faults are accumulated in a bitfield by the
/// [`ThermalSupervisor`](crate::safety::ThermalSupervisor) so both bands can
/// be tracked and cleared independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThermalFault {
    /// Hottest sensor is above the critical threshold.
    AboveCritical = 0b0000_0001,
    /// Hottest sensor is above the emergency threshold.
    AboveEmergency = 0b0000_0010,
}

impl ThermalFault {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ThermalFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AboveCritical => write!(f, "above critical threshold"),
            Self::AboveEmergency => write!(f, "above emergency threshold"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
