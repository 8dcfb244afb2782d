//! thermctl: Demo Entry Point
//!
//! Runs the thermal control loop against three simulated sensors and
//! three fans, logs status periodically and prints the final status as
//! JSON on exit.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                      │
//! │                                                               │
//! │  SimulatedSource          LogEventSink                        │
//! │  (TemperatureSource)      (EventSink)                         │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ─────────────────       │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────┐      │
//! │  │          ThermalService (pure logic)                │      │
//! │  │  SensorBank · FanCurve · FanBank · Supervisor       │      │
//! │  └─────────────────────────────────────────────────────┘      │
//! │                                                               │
//! │  ThermalController (loop thread · cancellation · status)      │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Environment:
//! - `THERMCTL_CONFIG`: TOML or JSON config file (defaults otherwise)
//! - `THERMCTL_RUN_SECS`: how long to run before stopping (default 30)
//! - `RUST_LOG`: log filter (default `info`)
#![deny(unused_must_use)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};

use thermctl::adapters::log_sink::LogEventSink;
use thermctl::app::events::ThermalEvent;
use thermctl::app::ports::EventSink;
use thermctl::config::ThermalConfig;
use thermctl::controller::ThermalController;

const RUN_SECS_ENV: &str = "THERMCTL_RUN_SECS";
const DEFAULT_RUN_SECS: u64 = 30;
const STATUS_PERIOD: Duration = Duration::from_secs(5);

const SENSORS: [(&str, &str); 3] = [
    ("CPU_TEMP", "CPU Package"),
    ("GPU_TEMP", "GPU Core"),
    ("SYS_TEMP", "System Board"),
];
const FANS: [&str; 3] = ["CPU_FAN", "CASE_FAN_1", "CASE_FAN_2"];

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔═══════════════════════════════════════╗");
    info!("║  thermctl v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚═══════════════════════════════════════╝");

    let config = ThermalConfig::load_or_default();
    let run_for = run_duration();

    let mut controller = ThermalController::new(config).context("invalid configuration")?;
    for (id, location) in SENSORS {
        controller
            .add_simulated_sensor(id, location)
            .with_context(|| format!("adding sensor {id}"))?;
    }
    for id in FANS {
        controller
            .add_fan(id)
            .with_context(|| format!("adding fan {id}"))?;
    }

    controller.start().context("starting control loop")?;
    info!("Running for {} s", run_for.as_secs());

    let mut telemetry = LogEventSink::new();
    let started = Instant::now();
    while controller.is_running() && started.elapsed() < run_for {
        let remaining = run_for.saturating_sub(started.elapsed());
        std::thread::sleep(STATUS_PERIOD.min(remaining));
        telemetry.emit(&ThermalEvent::Telemetry(controller.status()));
    }

    if !controller.stop() {
        warn!("Control loop did not confirm stop in time");
    }

    let status = controller.status();
    println!(
        "{}",
        serde_json::to_string_pretty(&status).context("serialising final status")?
    );
    Ok(())
}

fn run_duration() -> Duration {
    let secs = match std::env::var(RUN_SECS_ENV) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a number ({}), using {}", RUN_SECS_ENV, raw, DEFAULT_RUN_SECS);
            DEFAULT_RUN_SECS
        }),
        Err(_) => DEFAULT_RUN_SECS,
    };
    Duration::from_secs(secs)
}
