//! Port traits: the hexagonal boundary between control logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ThermalService (domain)
//! ```
//!
//! Temperature sources and event sinks implement these traits.  The
//! service owns them as trait objects so the whole bundle can move onto
//! the control-loop thread, which is why both ports require `Send`.

use crate::error::SensorError;

use super::events::ThermalEvent;

// ───────────────────────────────────────────────────────────────
// Temperature source (driven adapter: sensor → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one call per control tick per sensor.
pub trait TemperatureSource: Send {
    /// Next reading in °C.
    fn read(&mut self) -> Result<f32, SensorError>;
}

/// Closures make handy one-off sources in tests and demos.
impl<F> TemperatureSource for F
where
    F: FnMut() -> Result<f32, SensorError> + Send,
{
    fn read(&mut self) -> Result<f32, SensorError> {
        self()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`ThermalEvent`]s through this port.
/// Adapters decide where they go.
pub trait EventSink: Send {
    fn emit(&mut self, event: &ThermalEvent);
}

/// Sink that drops every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &ThermalEvent) {}
}
