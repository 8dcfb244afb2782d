//! Integration tests for the ThermalService tick pipeline:
//! sources → sensor bank → fan curve → fans → supervisor → events.

use thermctl::Error;
use thermctl::app::events::ThermalEvent;
use thermctl::app::service::{ThermalService, TickOutcome};
use thermctl::config::ThermalConfig;
use thermctl::error::SensorError;
use thermctl::sensors::sim::ScriptedSource;

use crate::mock_sources::{RecordingSink, SharedTemp, flaky};

fn make_service(config: ThermalConfig) -> (ThermalService, RecordingSink) {
    let mut svc = ThermalService::new(config).unwrap();
    for fan in ["CPU_FAN", "CASE_FAN_1", "CASE_FAN_2"] {
        svc.add_fan(fan).unwrap();
    }
    (svc, RecordingSink::new())
}

fn fan_speeds(svc: &ThermalService) -> Vec<f32> {
    svc.fans().iter().map(|f| f.current_speed()).collect()
}

// ── Fan curve through the tick ────────────────────────────────

#[test]
fn hottest_sensor_drives_every_fan() {
    let (mut svc, mut sink) = make_service(ThermalConfig::default());
    svc.add_sensor("CPU_TEMP", "CPU Package", Box::new(ScriptedSource::new([75.0])))
        .unwrap();
    svc.add_sensor("SYS_TEMP", "System Board", Box::new(ScriptedSource::new([40.0])))
        .unwrap();

    assert_eq!(svc.tick(&mut sink), Ok(TickOutcome::Continue));

    assert_eq!(svc.max_temperature(), 75.0);
    for speed in fan_speeds(&svc) {
        assert!((speed - 45.0).abs() < 1e-4, "got {speed}");
    }
    assert_eq!(
        sink.count(|e| matches!(e, ThermalEvent::FanAdjusted { .. })),
        3,
        "each fan should report one adjustment"
    );
}

#[test]
fn cool_reading_keeps_fans_off_and_quiet() {
    let (mut svc, mut sink) = make_service(ThermalConfig::default());
    svc.add_sensor("CPU_TEMP", "CPU Package", Box::new(ScriptedSource::new([45.0])))
        .unwrap();

    svc.tick(&mut sink).unwrap();

    assert!(fan_speeds(&svc).iter().all(|&s| s == 0.0));
    assert!(sink.events().is_empty());
}

#[test]
fn small_changes_are_not_counted_as_adjustments() {
    let (mut svc, mut sink) = make_service(ThermalConfig::default());
    // 70.0 → 30 %, 71.0 → 33 %: a 3-point move stays under the 5-point threshold.
    svc.add_sensor("CPU_TEMP", "CPU Package", Box::new(ScriptedSource::new([70.0, 71.0])))
        .unwrap();

    svc.tick(&mut sink).unwrap();
    svc.tick(&mut sink).unwrap();

    let fan = svc.fans().get("CPU_FAN").unwrap();
    assert!((fan.current_speed() - 33.0).abs() < 1e-4);
    assert_eq!(fan.speed_adjustments(), 1);
}

#[test]
fn slew_limit_converges_over_ticks() {
    let config = ThermalConfig {
        fan_slew_percent_per_tick: 20.0,
        ..ThermalConfig::default()
    };
    let (mut svc, mut sink) = make_service(config);
    svc.add_sensor("CPU_TEMP", "CPU Package", Box::new(ScriptedSource::new([85.0])))
        .unwrap();

    let mut seen = Vec::new();
    for _ in 0..6 {
        svc.tick(&mut sink).unwrap();
        seen.push(svc.fans().get("CPU_FAN").unwrap().current_speed());
    }

    assert_eq!(seen, vec![20.0, 40.0, 60.0, 80.0, 100.0, 100.0]);
    assert_eq!(svc.fans().get("CPU_FAN").unwrap().target_speed(), 100.0);

    // One commanded change per fan, not one per converging tick.
    assert_eq!(svc.fans().get("CPU_FAN").unwrap().speed_adjustments(), 1);
    let adjusted: Vec<_> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ThermalEvent::FanAdjusted { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(adjusted, vec![(0.0, 100.0); 3]);
}

// ── Supervision ───────────────────────────────────────────────

#[test]
fn above_critical_warns_each_tick() {
    let (mut svc, mut sink) = make_service(ThermalConfig::default());
    svc.add_sensor("GPU_TEMP", "GPU Core", Box::new(ScriptedSource::new([82.5])))
        .unwrap();

    svc.tick(&mut sink).unwrap();
    svc.tick(&mut sink).unwrap();

    assert!(fan_speeds(&svc).iter().all(|&s| (s - 75.0).abs() < 1e-4));
    assert_eq!(svc.status(false).thermal_events, 2);
    assert_eq!(
        sink.count(|e| matches!(e, ThermalEvent::ThermalWarning { .. })),
        2
    );
}

#[test]
fn exactly_at_emergency_runs_fans_flat_out_without_shutdown() {
    let (mut svc, mut sink) = make_service(ThermalConfig::default());
    svc.add_sensor("CPU_TEMP", "CPU Package", Box::new(ScriptedSource::new([85.0])))
        .unwrap();

    assert_eq!(svc.tick(&mut sink), Ok(TickOutcome::Continue));
    assert!(fan_speeds(&svc).iter().all(|&s| s == 100.0));
    assert_eq!(svc.status(false).emergency_shutdowns, 0);
}

#[test]
fn above_emergency_requests_shutdown() {
    let (mut svc, mut sink) = make_service(ThermalConfig::default());
    let temp = SharedTemp::new(86.0);
    svc.add_sensor("CPU_TEMP", "CPU Package", temp.source()).unwrap();

    assert_eq!(svc.tick(&mut sink), Ok(TickOutcome::Shutdown));

    let status = svc.status(false);
    assert_eq!(status.emergency_shutdowns, 1);
    assert_eq!(status.thermal_events, 1);
    assert!(fan_speeds(&svc).iter().all(|&s| s == 100.0));
    assert_eq!(
        sink.count(|e| matches!(e, ThermalEvent::EmergencyShutdown { max_c } if *max_c == 86.0)),
        1
    );

    temp.set(60.0);
    assert_eq!(svc.tick(&mut sink), Ok(TickOutcome::Continue));
    assert!(!svc.supervisor().shutdown_required());
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn sensor_failure_fails_tick_but_not_service() {
    let (mut svc, mut sink) = make_service(ThermalConfig::default());
    svc.add_sensor("CPU_TEMP", "CPU Package", flaky(1, 50.0)).unwrap();
    svc.add_sensor("GPU_TEMP", "GPU Core", Box::new(ScriptedSource::new([75.0])))
        .unwrap();

    let first = svc.tick(&mut sink);
    assert_eq!(first, Err(Error::Sensor(SensorError::ReadFailed)));
    // The healthy sensor was still read; fans were not touched.
    assert_eq!(svc.sensors().get("GPU_TEMP").unwrap().current_temp(), 75.0);
    assert_eq!(svc.sensors().get("CPU_TEMP").unwrap().current_temp(), 25.0);
    assert!(fan_speeds(&svc).iter().all(|&s| s == 0.0));
    assert_eq!(
        sink.count(|e| matches!(e, ThermalEvent::TickFailed(_))),
        1
    );

    assert_eq!(svc.tick(&mut sink), Ok(TickOutcome::Continue));
    assert!(fan_speeds(&svc).iter().all(|&s| (s - 45.0).abs() < 1e-4));

    let status = svc.status(false);
    assert_eq!(status.ticks, 2);
    assert_eq!(status.failed_ticks, 1);
}

#[test]
fn non_finite_reading_is_rejected() {
    let (mut svc, mut sink) = make_service(ThermalConfig::default());
    svc.add_sensor("CPU_TEMP", "CPU Package", Box::new(ScriptedSource::new([f32::NAN])))
        .unwrap();

    assert_eq!(svc.tick(&mut sink), Err(Error::Sensor(SensorError::NotFinite)));
    assert_eq!(svc.max_temperature(), 25.0);
}

// ── Prediction ────────────────────────────────────────────────

#[test]
fn linear_ramp_is_predicted_accurately() {
    let config = ThermalConfig {
        prediction_steps: 3,
        ..ThermalConfig::default()
    };
    let (mut svc, mut sink) = make_service(config);
    let ramp: Vec<f32> = (0..30).map(|i| 30.0 + i as f32 * 0.5).collect();
    svc.add_sensor("CPU_TEMP", "CPU Package", Box::new(ScriptedSource::new(ramp)))
        .unwrap();

    for _ in 0..20 {
        svc.tick(&mut sink).unwrap();
    }

    let sensor = svc.sensors().get("CPU_TEMP").unwrap();
    // Current is 39.5 after 20 readings; three steps ahead is 41.0.
    assert!((sensor.current_temp() - 39.5).abs() < 1e-4);
    assert!((sensor.predicted_temp() - 41.0).abs() < 1e-3);
    let err = sensor.mean_prediction_error().expect("predictions scored");
    assert!(err < 1e-3, "mean error {err}");
}

// ── Status ────────────────────────────────────────────────────

#[test]
fn status_serialises_to_json() {
    let (mut svc, mut sink) = make_service(ThermalConfig::default());
    svc.add_sensor("CPU_TEMP", "CPU Package", Box::new(ScriptedSource::new([72.0])))
        .unwrap();
    svc.tick(&mut sink).unwrap();

    let json = serde_json::to_value(svc.status(true)).unwrap();
    assert_eq!(json["is_running"], true);
    assert_eq!(json["sensors"], 1);
    assert_eq!(json["fans"], 3);
    assert_eq!(json["sensor_data"][0]["sensor_id"], "CPU_TEMP");
    assert_eq!(json["sensor_data"][0]["location"], "CPU Package");
    assert_eq!(json["fan_data"][2]["fan_id"], "CASE_FAN_2");
    assert_eq!(json["fan_data"][0]["is_active"], true);
}
