//! Temperature sources that need no hardware.
//!
//! - [`SimulatedSource`]: Gaussian random walk clamped to a plausible
//!   range, the default source for every sensor the binary registers.
//! - [`ScriptedSource`]: replays a fixed sequence, then holds the last
//!   value.  Used by tests and demos that need deterministic input.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::app::ports::TemperatureSource;
use crate::error::{Error, Result, SensorError};

/// Lowest value the random walk can reach (°C).
pub const SIM_MIN_C: f32 = 20.0;
/// Highest value the random walk can reach (°C).
pub const SIM_MAX_C: f32 = 85.0;

pub struct SimulatedSource {
    value: f32,
    noise: Normal<f32>,
    rng: StdRng,
}

impl SimulatedSource {
    /// `seed = None` seeds from OS entropy.
    pub fn new(initial_c: f32, std_dev: f32, seed: Option<u64>) -> Result<Self> {
        // `Normal::new` only rejects a non-finite sigma.
        if !(std_dev.is_finite() && std_dev >= 0.0) {
            return Err(Error::Config("noise_std_dev must be finite and >= 0"));
        }
        let noise = Normal::new(0.0, std_dev)
            .map_err(|_| Error::Config("noise_std_dev must be finite and >= 0"))?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            value: initial_c.clamp(SIM_MIN_C, SIM_MAX_C),
            noise,
            rng,
        })
    }
}

impl TemperatureSource for SimulatedSource {
    fn read(&mut self) -> core::result::Result<f32, SensorError> {
        let step = self.noise.sample(&mut self.rng);
        self.value = (self.value + step).clamp(SIM_MIN_C, SIM_MAX_C);
        Ok(self.value)
    }
}

pub struct ScriptedSource {
    values: Vec<f32>,
    next: usize,
}

impl ScriptedSource {
    pub fn new(values: impl IntoIterator<Item = f32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            next: 0,
        }
    }

    /// Values not yet replayed.
    pub fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.next)
    }
}

impl TemperatureSource for ScriptedSource {
    fn read(&mut self) -> core::result::Result<f32, SensorError> {
        let idx = self.next.min(self.values.len().saturating_sub(1));
        let value = self.values.get(idx).copied().ok_or(SensorError::ReadFailed)?;
        if self.next < self.values.len() {
            self.next += 1;
        }
        Ok(value)
    }
}
