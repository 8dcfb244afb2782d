//! Mock adapters for integration tests.
//!
//! [`SharedTemp`] is a temperature source the test can retarget while the
//! loop is running; [`RecordingSink`] keeps every emitted event so tests
//! can assert on the full event history.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thermctl::app::events::{StopReason, ThermalEvent};
use thermctl::app::ports::{EventSink, TemperatureSource};
use thermctl::config::ThermalConfig;
use thermctl::error::SensorError;

// ── SharedTemp ────────────────────────────────────────────────

/// Source that returns whatever the test last set.
#[derive(Clone)]
pub struct SharedTemp {
    bits: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl SharedTemp {
    pub fn new(celsius: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(celsius.to_bits())),
        }
    }

    pub fn set(&self, celsius: f32) {
        self.bits.store(celsius.to_bits(), Ordering::Release);
    }

    pub fn source(&self) -> Box<dyn TemperatureSource> {
        Box::new(self.clone())
    }
}

impl TemperatureSource for SharedTemp {
    fn read(&mut self) -> Result<f32, SensorError> {
        Ok(f32::from_bits(self.bits.load(Ordering::Acquire)))
    }
}

/// Source that fails its first `failures` reads, then reports `celsius`.
pub fn flaky(failures: u32, celsius: f32) -> Box<dyn TemperatureSource> {
    let mut calls = 0u32;
    Box::new(move || -> Result<f32, SensorError> {
        calls += 1;
        if calls <= failures {
            Err(SensorError::ReadFailed)
        } else {
            Ok(celsius)
        }
    })
}

/// Source that alternates between two readings on every call.
pub fn alternating(a: f32, b: f32) -> Box<dyn TemperatureSource> {
    let mut flip = false;
    Box::new(move || -> Result<f32, SensorError> {
        flip = !flip;
        Ok(if flip { a } else { b })
    })
}

/// Source that blocks for `delay` on every read while the returned flag
/// is set.
pub fn stalling(celsius: f32, delay: Duration) -> (Box<dyn TemperatureSource>, Arc<AtomicBool>) {
    let stall = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stall);
    let source: Box<dyn TemperatureSource> = Box::new(move || -> Result<f32, SensorError> {
        if flag.load(Ordering::Acquire) {
            std::thread::sleep(delay);
        }
        Ok(celsius)
    });
    (source, stall)
}

// ── RecordingSink ─────────────────────────────────────────────

/// Event sink whose log stays readable after the sink moves onto the
/// loop thread.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ThermalEvent>>>,
    /// Extra time spent handling `Stopped(EmergencyShutdown)`.
    emergency_stop_delay: Duration,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that is slow to process the emergency `Stopped` event.
    pub fn slow_on_emergency_stop(delay: Duration) -> Self {
        Self {
            emergency_stop_delay: delay,
            ..Self::default()
        }
    }

    pub fn boxed(&self) -> Box<dyn EventSink> {
        Box::new(self.clone())
    }

    pub fn events(&self) -> Vec<ThermalEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&ThermalEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ThermalEvent) {
        if *event == ThermalEvent::Stopped(StopReason::EmergencyShutdown) {
            std::thread::sleep(self.emergency_stop_delay);
        }
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Fast loop config for tests.
pub fn fast_config() -> ThermalConfig {
    ThermalConfig {
        control_interval_ms: 10,
        stop_timeout_ms: 1000,
        rng_seed: Some(7),
        ..ThermalConfig::default()
    }
}

/// Poll `cond` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
