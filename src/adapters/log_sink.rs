//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured control-loop events to
//! the `log` facade.  The binary installs `env_logger` behind it.

use log::{error, info, warn};

use crate::app::events::{StopReason, ThermalEvent};
use crate::app::ports::EventSink;

/// Adapter that logs every [`ThermalEvent`].
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ThermalEvent) {
        match event {
            ThermalEvent::Telemetry(t) => {
                info!(
                    "TELEM | running={} | max={:.1}\u{00b0}C | sensors={} fans={} | \
                     events={} shutdowns={} | ticks={} failed={}",
                    t.is_running,
                    t.max_temperature,
                    t.sensors,
                    t.fans,
                    t.thermal_events,
                    t.emergency_shutdowns,
                    t.ticks,
                    t.failed_ticks,
                );
            }
            ThermalEvent::Started { sensors, fans } => {
                info!("START | sensors={} fans={}", sensors, fans);
            }
            ThermalEvent::Stopped(StopReason::Requested) => {
                info!("STOP | requested");
            }
            ThermalEvent::Stopped(StopReason::EmergencyShutdown) => {
                error!("STOP | emergency shutdown");
            }
            ThermalEvent::FanAdjusted { fan_id, from, to } => {
                info!("FAN | {} {:.1}% -> {:.1}%", fan_id, from, to);
            }
            ThermalEvent::ThermalWarning { max_c } => {
                warn!("WARN | high temperature {:.1}\u{00b0}C", max_c);
            }
            ThermalEvent::EmergencyShutdown { max_c } => {
                error!("EMERGENCY | {:.1}\u{00b0}C", max_c);
            }
            ThermalEvent::TickFailed(e) => {
                error!("TICK | {}", e);
            }
        }
    }
}
