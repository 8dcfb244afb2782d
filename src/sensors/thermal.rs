//! Thermal sensor with bounded history and linear trend prediction.
//!
//! Each sensor pulls readings from a [`TemperatureSource`] port, keeps
//! the most recent [`HISTORY_LEN`] values, and can project the current
//! trend a few ticks ahead with a least-squares slope over the last
//! [`TREND_WINDOW`] readings.
//!
//! Predictions are queued and scored once the reading they target
//! arrives, giving a rolling mean absolute error over the last
//! [`ERROR_WINDOW`] scored predictions.

use heapless::{Deque, HistoryBuffer};
use serde::Serialize;

use crate::Label;
use crate::app::ports::TemperatureSource;
use crate::config::MAX_PREDICTION_STEPS;
use crate::error::SensorError;

/// Readings retained per sensor.
pub const HISTORY_LEN: usize = 100;
/// Readings used for the trend slope.
pub const TREND_WINDOW: usize = 10;
/// Scored predictions retained for the error average.
pub const ERROR_WINDOW: usize = 50;

const PENDING_CAP: usize = MAX_PREDICTION_STEPS as usize;

/// Point-in-time view of one sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStatus {
    pub sensor_id: Label,
    pub location: Label,
    pub current_temp: f32,
    pub predicted_temp: f32,
}

pub struct ThermalSensor {
    id: Label,
    location: Label,
    source: Box<dyn TemperatureSource>,
    current: f32,
    predicted: f32,
    history: HistoryBuffer<f32, HISTORY_LEN>,
    /// (reading index the prediction targets, predicted value)
    pending: Deque<(u64, f32), PENDING_CAP>,
    errors: HistoryBuffer<f32, ERROR_WINDOW>,
    reads: u64,
    read_failures: u64,
}

impl ThermalSensor {
    pub fn new(
        id: Label,
        location: Label,
        source: Box<dyn TemperatureSource>,
        initial_c: f32,
    ) -> Self {
        Self {
            id,
            location,
            source,
            current: initial_c,
            predicted: initial_c,
            history: HistoryBuffer::new(),
            pending: Deque::new(),
            errors: HistoryBuffer::new(),
            reads: 0,
            read_failures: 0,
        }
    }

    /// Pull the next reading from the source.
    ///
    /// On failure the previous value is retained.
    pub fn read(&mut self) -> Result<f32, SensorError> {
        let value = match self.source.read() {
            Ok(v) if v.is_finite() => v,
            Ok(_) => {
                self.read_failures += 1;
                return Err(SensorError::NotFinite);
            }
            Err(e) => {
                self.read_failures += 1;
                return Err(e);
            }
        };

        self.reads += 1;
        self.current = value;
        self.history.write(value);
        self.score_due_predictions(value);
        Ok(value)
    }

    /// Project the temperature `steps_ahead` readings into the future.
    ///
    /// Falls back to the current value until [`TREND_WINDOW`] readings
    /// have been collected.
    pub fn predict(&mut self, steps_ahead: u32) -> f32 {
        let n = self.history.len();
        if n < TREND_WINDOW {
            self.predicted = self.current;
            return self.predicted;
        }

        let mut window = [0.0f32; TREND_WINDOW];
        for (slot, v) in window
            .iter_mut()
            .zip(self.history.oldest_ordered().skip(n - TREND_WINDOW))
        {
            *slot = *v;
        }
        let slope = trend_slope(&window);
        self.predicted = self.current + slope * steps_ahead as f32;

        if self.pending.is_full() {
            self.pending.pop_front();
        }
        let due = self.reads + u64::from(steps_ahead);
        let queued = self.pending.push_back((due, self.predicted)).is_ok();
        debug_assert!(queued, "pending queue has room after pop_front");

        self.predicted
    }

    /// Mean absolute error of the scored predictions, if any.
    pub fn mean_prediction_error(&self) -> Option<f32> {
        let n = self.errors.len();
        if n == 0 {
            return None;
        }
        Some(self.errors.as_slice().iter().sum::<f32>() / n as f32)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn current_temp(&self) -> f32 {
        self.current
    }

    pub fn predicted_temp(&self) -> f32 {
        self.predicted
    }

    /// Retained readings, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &f32> {
        self.history.oldest_ordered()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn read_count(&self) -> u64 {
        self.reads
    }

    pub fn read_failures(&self) -> u64 {
        self.read_failures
    }

    pub fn status(&self) -> SensorStatus {
        SensorStatus {
            sensor_id: self.id.clone(),
            location: self.location.clone(),
            current_temp: self.current,
            predicted_temp: self.predicted,
        }
    }

    // ── Internal ──────────────────────────────────────────────────

    fn score_due_predictions(&mut self, actual: f32) {
        while let Some(&(due, predicted)) = self.pending.front() {
            if due > self.reads {
                break;
            }
            self.pending.pop_front();
            if due == self.reads {
                self.errors.write((actual - predicted).abs());
            }
        }
    }
}

/// Least-squares slope of evenly spaced samples (units per sample).
fn trend_slope(samples: &[f32]) -> f32 {
    let n = samples.len();
    if n < 2 {
        return 0.0;
    }
    let mean_x = (n - 1) as f32 / 2.0;
    let mean_y = samples.iter().sum::<f32>() / n as f32;

    let (num, den) = samples
        .iter()
        .enumerate()
        .fold((0.0f32, 0.0f32), |(num, den), (i, y)| {
            let dx = i as f32 - mean_x;
            (num + dx * (y - mean_y), den + dx * dx)
        });
    if den == 0.0 { 0.0 } else { num / den }
}
