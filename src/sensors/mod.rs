//! Sensor subsystem: individual thermal sensors and the aggregating [`SensorBank`].
//!
//! The bank owns every registered sensor and is read once per control
//! tick.  A single flaky source must not hide the others, so every sensor
//! is read even when an earlier one fails.

pub mod sim;
pub mod thermal;

use heapless::Vec;
use log::warn;

use crate::error::{Error, Result};
use thermal::{SensorStatus, ThermalSensor};

/// Maximum number of sensors per controller.
pub const MAX_SENSORS: usize = 8;

#[derive(Default)]
pub struct SensorBank {
    sensors: Vec<ThermalSensor, MAX_SENSORS>,
}

impl SensorBank {
    pub fn new() -> Self {
        Self { sensors: Vec::new() }
    }

    pub fn add(&mut self, sensor: ThermalSensor) -> Result<()> {
        self.sensors
            .push(sensor)
            .map_err(|_| Error::Config("sensor limit reached"))
    }

    /// Read every sensor.
    ///
    /// Failed sensors keep their previous value; the first failure is
    /// returned after all sensors have been polled.
    pub fn read_all(&mut self) -> Result<()> {
        let mut first_err = None;
        for sensor in &mut self.sensors {
            if let Err(e) = sensor.read() {
                warn!("SENSOR | {}: {}", sensor.id(), e);
                if first_err.is_none() {
                    first_err = Some(Error::Sensor(e));
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Refresh every sensor's trend prediction.
    pub fn predict_all(&mut self, steps_ahead: u32) {
        for sensor in &mut self.sensors {
            sensor.predict(steps_ahead);
        }
    }

    /// Hottest current reading, or 0.0 with no sensors registered.
    pub fn max_temperature(&self) -> f32 {
        self.sensors
            .iter()
            .map(ThermalSensor::current_temp)
            .reduce(f32::max)
            .unwrap_or(0.0)
    }

    pub fn get(&self, id: &str) -> Option<&ThermalSensor> {
        self.sensors.iter().find(|s| s.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThermalSensor> {
        self.sensors.iter()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn statuses(&self) -> Vec<SensorStatus, MAX_SENSORS> {
        self.sensors.iter().map(ThermalSensor::status).collect()
    }
}
