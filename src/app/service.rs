//! Thermal service: the hexagonal core.
//!
//! [`ThermalService`] owns the sensor bank, the fans, the fan curve and
//! the thermal supervisor.  It knows nothing about threads or timers; the
//! [`ThermalController`](crate::controller::ThermalController) calls
//! [`ThermalService::tick`] once per interval.
//!
//! ```text
//!  TemperatureSource ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                        │      ThermalService       │
//!            FanBank  ◀──│  FanCurve · Supervisor    │
//!                        └──────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::ThermalConfig;
use crate::control::curve::FanCurve;
use crate::drivers::FanBank;
use crate::drivers::fan::FanDriver;
use crate::error::{Error, Result, ThermalFault};
use crate::label;
use crate::safety::ThermalSupervisor;
use crate::sensors::SensorBank;
use crate::sensors::sim::SimulatedSource;
use crate::sensors::thermal::ThermalSensor;

use super::events::{StatusSnapshot, ThermalEvent};
use super::ports::{EventSink, TemperatureSource};

/// What the loop should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// Emergency threshold exceeded; the loop must stop.
    Shutdown,
}

/// The thermal service orchestrates one control tick at a time.
pub struct ThermalService {
    config: ThermalConfig,
    curve: FanCurve,
    sensors: SensorBank,
    fans: FanBank,
    supervisor: ThermalSupervisor,
    tick_count: u64,
    failed_ticks: u64,
}

impl ThermalService {
    /// Construct the service from a validated configuration.
    pub fn new(config: ThermalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            curve: FanCurve::new(config.thresholds),
            supervisor: ThermalSupervisor::new(config.thresholds),
            sensors: SensorBank::new(),
            fans: FanBank::new(),
            config,
            tick_count: 0,
            failed_ticks: 0,
        })
    }

    // ── Registration ──────────────────────────────────────────

    /// Register a sensor backed by any [`TemperatureSource`].
    pub fn add_sensor(
        &mut self,
        id: &str,
        location: &str,
        source: Box<dyn TemperatureSource>,
    ) -> Result<()> {
        if self.sensors.get(id).is_some() {
            return Err(Error::Config("duplicate sensor id"));
        }
        let sensor = ThermalSensor::new(
            label(id)?,
            label(location)?,
            source,
            self.config.initial_temperature_c,
        );
        self.sensors.add(sensor)?;
        info!("Added thermal sensor: {} at {}", id, location);
        Ok(())
    }

    /// Register a sensor fed by a Gaussian random walk.
    ///
    /// With a configured seed, each sensor gets `seed + index` so the
    /// sensors do not move in lockstep.
    pub fn add_simulated_sensor(&mut self, id: &str, location: &str) -> Result<()> {
        let seed = self
            .config
            .rng_seed
            .map(|s| s.wrapping_add(self.sensors.len() as u64));
        let source = SimulatedSource::new(
            self.config.initial_temperature_c,
            self.config.noise_std_dev,
            seed,
        )?;
        self.add_sensor(id, location, Box::new(source))
    }

    pub fn add_fan(&mut self, id: &str) -> Result<()> {
        if self.fans.get(id).is_some() {
            return Err(Error::Config("duplicate fan id"));
        }
        let fan = FanDriver::with_limits(
            label(id)?,
            self.config.fan_slew_percent_per_tick,
            self.config.fan_log_threshold_percent,
        );
        self.fans.add(fan)?;
        info!("Added fan controller: {}", id);
        Ok(())
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: read sensors → fan curve → fans → supervisor.
    ///
    /// A failed tick is counted, logged and emitted as
    /// [`ThermalEvent::TickFailed`] before the error is returned.
    pub fn tick(&mut self, sink: &mut (impl EventSink + ?Sized)) -> Result<TickOutcome> {
        self.tick_count += 1;
        match self.run_tick(&mut *sink) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.failed_ticks += 1;
                warn!("TICK | #{} failed: {}", self.tick_count, e);
                sink.emit(&ThermalEvent::TickFailed(e));
                Err(e)
            }
        }
    }

    fn run_tick(&mut self, sink: &mut (impl EventSink + ?Sized)) -> Result<TickOutcome> {
        // 1. Advance every sensor
        self.sensors.read_all()?;
        self.sensors.predict_all(self.config.prediction_steps);

        // 2. Hottest reading
        let max_c = self.sensors.max_temperature();

        // 3. Fan curve
        let speed = self.curve.fan_speed_for(max_c);

        // 4. Apply to every fan
        for fan in self.fans.iter_mut() {
            if let Some(adj) = fan.set_speed(speed)? {
                sink.emit(&ThermalEvent::FanAdjusted {
                    fan_id: label(fan.id())?,
                    from: adj.from,
                    to: adj.to,
                });
            }
        }

        // 5. Thermal supervision
        self.supervisor.evaluate(max_c);
        if self.supervisor.has_fault(ThermalFault::AboveCritical) {
            sink.emit(&ThermalEvent::ThermalWarning { max_c });
        }
        if self.supervisor.shutdown_required() {
            sink.emit(&ThermalEvent::EmergencyShutdown { max_c });
            return Ok(TickOutcome::Shutdown);
        }

        Ok(TickOutcome::Continue)
    }

    // ── Commands ──────────────────────────────────────────────

    /// Command one fan directly.  Out-of-range speeds are rejected and
    /// leave the fan untouched.  The next tick overrides the value.
    pub fn set_fan_speed(&mut self, fan_id: &str, speed: f32) -> Result<()> {
        let fan = self
            .fans
            .get_mut(fan_id)
            .ok_or(Error::Config("unknown fan id"))?;
        match fan.set_speed(speed) {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("FAN | {}: {}", fan_id, e);
                Err(e.into())
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Assemble a status snapshot from the current state.
    pub fn status(&self, is_running: bool) -> StatusSnapshot {
        StatusSnapshot {
            is_running,
            sensors: self.sensors.len(),
            fans: self.fans.len(),
            max_temperature: self.sensors.max_temperature(),
            thermal_events: self.supervisor.thermal_events(),
            emergency_shutdowns: self.supervisor.emergency_shutdowns(),
            ticks: self.tick_count,
            failed_ticks: self.failed_ticks,
            sensor_data: self.sensors.statuses(),
            fan_data: self.fans.statuses(),
        }
    }

    /// Target fan speed the curve assigns to `temperature_c`.
    pub fn fan_speed_for(&self, temperature_c: f32) -> f32 {
        self.curve.fan_speed_for(temperature_c)
    }

    pub fn max_temperature(&self) -> f32 {
        self.sensors.max_temperature()
    }

    pub fn config(&self) -> &ThermalConfig {
        &self.config
    }

    pub fn sensors(&self) -> &SensorBank {
        &self.sensors
    }

    pub fn fans(&self) -> &FanBank {
        &self.fans
    }

    pub fn supervisor(&self) -> &ThermalSupervisor {
        &self.supervisor
    }

    /// Total control ticks attempted.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
