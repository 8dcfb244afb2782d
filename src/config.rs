//! Controller configuration parameters
//!
//! All tunable parameters for the thermal control loop.  Values can be
//! loaded from a TOML or JSON file; every load path runs [`ThermalConfig::validate`].

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming an optional config file for the binary.
pub const CONFIG_ENV: &str = "THERMCTL_CONFIG";

/// Upper bound for [`ThermalConfig::prediction_steps`] (size of the pending
/// prediction queue in each sensor).
pub const MAX_PREDICTION_STEPS: u32 = 16;

/// The three temperature bands that shape the fan response.
///
/// Invariant: `warning < critical < emergency`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Fans start at 30 % from here (°C).
    pub warning_c: f32,
    /// Fans reach 60 % here; readings above count as thermal events (°C).
    pub critical_c: f32,
    /// Fans run at 100 % from here; readings above trigger shutdown (°C).
    pub emergency_c: f32,
}

impl Thresholds {
    pub fn new(warning_c: f32, critical_c: f32, emergency_c: f32) -> Result<Self> {
        let t = Self {
            warning_c,
            critical_c,
            emergency_c,
        };
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> Result<()> {
        let all_finite = self.warning_c.is_finite()
            && self.critical_c.is_finite()
            && self.emergency_c.is_finite();
        if !all_finite {
            return Err(Error::Config("thresholds must be finite"));
        }
        if !(self.warning_c < self.critical_c && self.critical_c < self.emergency_c) {
            return Err(Error::Config(
                "thresholds must satisfy warning < critical < emergency",
            ));
        }
        Ok(())
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_c: 70.0,
            critical_c: 80.0,
            emergency_c: 85.0,
        }
    }
}

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalConfig {
    // --- Control bands ---
    pub thresholds: Thresholds,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_interval_ms: u64,
    /// How long `stop()` waits for the loop to exit (milliseconds)
    pub stop_timeout_ms: u64,

    // --- Simulation ---
    /// Standard deviation of the simulated random-walk step (°C)
    pub noise_std_dev: f32,
    /// Starting value of every simulated sensor (°C)
    pub initial_temperature_c: f32,
    /// Seed for simulated sources; `None` seeds from OS entropy
    pub rng_seed: Option<u64>,

    // --- Fans ---
    /// Largest change of a fan's current speed per tick (percentage points)
    pub fan_slew_percent_per_tick: f32,
    /// Changes larger than this are logged and counted as adjustments
    pub fan_log_threshold_percent: f32,

    // --- Trend ---
    /// Ticks ahead for each sensor's trend prediction
    pub prediction_steps: u32,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),

            control_interval_ms: 1000, // 1 Hz
            stop_timeout_ms: 2000,

            noise_std_dev: 0.5,
            initial_temperature_c: 25.0,
            rng_seed: None,

            fan_slew_percent_per_tick: 100.0,
            fan_log_threshold_percent: 5.0,

            prediction_steps: 5,
        }
    }
}

impl ThermalConfig {
    /// Range-check every field.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if self.control_interval_ms == 0 {
            return Err(Error::Config("control_interval_ms must be > 0"));
        }
        if self.stop_timeout_ms == 0 {
            return Err(Error::Config("stop_timeout_ms must be > 0"));
        }
        if !(self.noise_std_dev.is_finite() && self.noise_std_dev >= 0.0) {
            return Err(Error::Config("noise_std_dev must be finite and >= 0"));
        }
        if !self.initial_temperature_c.is_finite() {
            return Err(Error::Config("initial_temperature_c must be finite"));
        }
        let slew = self.fan_slew_percent_per_tick;
        if !(slew > 0.0 && slew <= 100.0) {
            return Err(Error::Config("fan_slew_percent_per_tick must be in (0, 100]"));
        }
        let log_threshold = self.fan_log_threshold_percent;
        if !(log_threshold.is_finite() && log_threshold >= 0.0) {
            return Err(Error::Config("fan_log_threshold_percent must be finite and >= 0"));
        }
        if self.prediction_steps == 0 || self.prediction_steps > MAX_PREDICTION_STEPS {
            return Err(Error::Config("prediction_steps must be in 1..=16"));
        }
        Ok(())
    }

    /// Parse a TOML document; missing fields fall back to defaults.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document; missing fields fall back to defaults.
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file (chosen by extension, TOML otherwise).
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Load from `$THERMCTL_CONFIG` if set, falling back to defaults.
    pub fn load_or_default() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            info!("CONFIG | no {} set, using defaults", CONFIG_ENV);
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => {
                info!("CONFIG | loaded from {}", Path::new(&path).display());
                config
            }
            Err(e) => {
                warn!("CONFIG | {:#}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Control interval as a `Duration`.
    pub fn control_interval(&self) -> core::time::Duration {
        core::time::Duration::from_millis(self.control_interval_ms)
    }

    /// Stop timeout as a `Duration`.
    pub fn stop_timeout(&self) -> core::time::Duration {
        core::time::Duration::from_millis(self.stop_timeout_ms)
    }
}
