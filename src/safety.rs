//! Thermal supervisor.
//!
//! The supervisor runs **every tick after the fans are updated** and
//! accumulates a fault bitmask from the hottest sensor reading.
//!
//! ## Fault lifecycle
//!
//! 1. The hottest reading goes above `critical`: `AboveCritical` is set
//!    and the thermal-event counter increments (once per tick above).
//! 2. It goes above `emergency`: `AboveEmergency` is set, the shutdown
//!    counter increments and the service reports [`TickOutcome::Shutdown`](crate::app::service::TickOutcome).
//! 3. Each tick the supervisor re-evaluates; a bit clears as soon as its
//!    condition does.
//!
//! Comparisons are strict: a reading exactly at `emergency` runs the
//! fans at 100 % but does not shut the loop down.

use log::{error, info, warn};

use crate::config::Thresholds;
use crate::error::ThermalFault;

/// Thermal supervisor.
pub struct ThermalSupervisor {
    thresholds: Thresholds,
    /// Latched fault bitmask.
    faults: u8,
    /// Ticks observed above `critical`.
    thermal_events: u32,
    /// Ticks observed above `emergency`.
    emergency_shutdowns: u32,
}

impl ThermalSupervisor {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            faults: 0,
            thermal_events: 0,
            emergency_shutdowns: 0,
        }
    }

    /// Evaluate the hottest reading of this tick.
    /// Returns the updated fault bitmask.
    pub fn evaluate(&mut self, max_c: f32) -> u8 {
        let above_critical = max_c > self.thresholds.critical_c;
        let above_emergency = max_c > self.thresholds.emergency_c;

        self.eval_fault(ThermalFault::AboveCritical, above_critical);
        self.eval_fault(ThermalFault::AboveEmergency, above_emergency);

        if above_critical {
            self.thermal_events = self.thermal_events.saturating_add(1);
            warn!("THERMAL | high temperature detected: {:.1}\u{00b0}C", max_c);
        }
        if above_emergency {
            self.emergency_shutdowns = self.emergency_shutdowns.saturating_add(1);
            error!(
                "THERMAL | emergency temperature {:.1}\u{00b0}C, shutting down",
                max_c
            );
        }

        self.faults
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: ThermalFault) -> bool {
        self.faults & fault.mask() != 0
    }

    /// True if the last evaluation demands shutdown.
    pub fn shutdown_required(&self) -> bool {
        self.has_fault(ThermalFault::AboveEmergency)
    }

    pub fn thermal_events(&self) -> u32 {
        self.thermal_events
    }

    pub fn emergency_shutdowns(&self) -> u32 {
        self.emergency_shutdowns
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: ThermalFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                info!("THERMAL FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("THERMAL FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
