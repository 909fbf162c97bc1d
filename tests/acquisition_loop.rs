//! Integration tests for the acquisition loop
//!
//! Time is paused (`start_paused = true`), so the tokio clock advances only
//! when every task is idle and sample timestamps come out exact.

use std::time::Duration;
use thermo_daq::acquisition::{
    command_channel, Acquisition, AcquisitionConfig, AcquisitionEvent, Command, RunState,
    StopReason,
};
use thermo_daq::hardware::capabilities::Reading;
use thermo_daq::hardware::mock::{ScriptStep, ScriptedThermometer};
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

fn config(total_samples: usize) -> AcquisitionConfig {
    AcquisitionConfig {
        total_samples,
        ..AcquisitionConfig::default()
    }
}

fn elapsed_of(report: &thermo_daq::acquisition::AcquisitionReport) -> Vec<f64> {
    report
        .samples
        .as_slice()
        .iter()
        .map(|s| s.elapsed_seconds)
        .collect()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
    }
}

/// Virtual time since `start`, to the millisecond.
fn assert_run_time(start: Instant, expected_ms: u128) {
    assert_eq!(start.elapsed().as_millis(), expected_ms);
}

/// Send `command` after `delay` of virtual time.
fn send_after(tx: &mpsc::Sender<Command>, delay: Duration, command: Command) {
    let tx = tx.clone();
    tokio::spawn(async move {
        sleep(delay).await;
        let _ = tx.send(command).await;
    });
}

// =============================================================================
// Cadence and quota
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_samples_once_per_interval_until_quota() {
    let (_tx, rx) = command_channel();
    let mut acquisition = Acquisition::new(ScriptedThermometer::constant(23.25), config(5), rx);

    let start = Instant::now();
    let report = acquisition.run(std::future::pending::<()>()).await;

    assert_eq!(report.stop_reason, StopReason::QuotaReached);
    assert_close(&elapsed_of(&report), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    assert!(report
        .samples
        .as_slice()
        .iter()
        .all(|s| s.temperature_celsius == 23.25));
    // No trailing sleep after the last sample
    assert_run_time(start, 4000);
    assert_eq!(acquisition.state(), RunState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_timestamps_strictly_increase() {
    let (_tx, rx) = command_channel();
    let mut acquisition = Acquisition::new(ScriptedThermometer::constant(20.0), config(30), rx);

    let report = acquisition.run(std::future::pending::<()>()).await;
    let times = elapsed_of(&report);

    assert_eq!(times.len(), 30);
    assert!(times.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_open_circuit_reads_do_not_count_toward_quota() {
    let (_tx, rx) = command_channel();
    let sensor = ScriptedThermometer::new([
        Reading::Celsius(20.0),
        Reading::OpenCircuit,
        Reading::Celsius(21.0),
    ]);
    let mut acquisition = Acquisition::new(sensor, config(4), rx);

    let start = Instant::now();
    let report = acquisition.run(std::future::pending::<()>()).await;

    assert_eq!(report.stop_reason, StopReason::QuotaReached);
    assert_eq!(report.faults, 2);
    assert_close(&elapsed_of(&report), &[0.0, 2.0, 3.0, 5.0]);
    assert_run_time(start, 5000);
    assert_eq!(acquisition.into_sensor().reads(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_full_default_run_collects_180_samples() {
    let (_tx, rx) = command_channel();
    let mut acquisition =
        Acquisition::new(ScriptedThermometer::constant(30.0), AcquisitionConfig::default(), rx);

    let report = acquisition.run(std::future::pending::<()>()).await;

    assert_eq!(report.samples.len(), 180);
    let last = report.samples.as_slice()[179];
    assert!((last.elapsed_seconds - 179.0).abs() < 1e-9);
}

// =============================================================================
// Operator commands
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_time_is_excluded_from_elapsed() {
    let (tx, rx) = command_channel();
    let mut acquisition = Acquisition::new(ScriptedThermometer::constant(22.0), config(5), rx);

    send_after(&tx, Duration::from_millis(2500), Command::Pause);
    send_after(&tx, Duration::from_millis(7550), Command::Resume);

    let start = Instant::now();
    let report = acquisition.run(std::future::pending::<()>()).await;

    // Pause takes effect at 3.0 s, resume at the 7.6 s poll
    assert_eq!(report.stop_reason, StopReason::QuotaReached);
    assert_close(&elapsed_of(&report), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_run_time(start, 8600);
}

#[tokio::test(start_paused = true)]
async fn test_no_reads_while_paused() {
    let (tx, rx) = command_channel();
    let mut acquisition = Acquisition::new(ScriptedThermometer::constant(22.0), config(3), rx);

    send_after(&tx, Duration::from_millis(500), Command::Pause);
    send_after(&tx, Duration::from_millis(60_050), Command::Resume);

    let report = acquisition.run(std::future::pending::<()>()).await;

    assert_eq!(report.samples.len(), 3);
    assert_eq!(acquisition.into_sensor().reads(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_quit_while_running_keeps_samples() {
    let (tx, rx) = command_channel();
    let mut acquisition = Acquisition::new(ScriptedThermometer::constant(25.0), config(180), rx);

    send_after(&tx, Duration::from_millis(3500), Command::Quit);
    let report = acquisition.run(std::future::pending::<()>()).await;

    assert_eq!(report.stop_reason, StopReason::Quit);
    assert_close(&elapsed_of(&report), &[0.0, 1.0, 2.0, 3.0]);
}

#[tokio::test(start_paused = true)]
async fn test_quit_while_paused() {
    let (tx, rx) = command_channel();
    let mut acquisition = Acquisition::new(ScriptedThermometer::constant(25.0), config(180), rx);
    let mut events = acquisition.subscribe();

    send_after(&tx, Duration::from_millis(1500), Command::Pause);
    send_after(&tx, Duration::from_millis(3050), Command::Quit);

    let start = Instant::now();
    let report = acquisition.run(std::future::pending::<()>()).await;

    assert_eq!(report.stop_reason, StopReason::Quit);
    assert_eq!(report.samples.len(), 2);
    // Quit is seen on the first 100 ms poll after it is queued
    assert_run_time(start, 3100);

    let mut lines = Vec::new();
    while let Ok(event) = events.try_recv() {
        lines.push(event.to_string());
    }
    assert_eq!(lines, ["START", "0.000,25.00", "1.000,25.00", "PAUSED", "STOP"]);
}

#[tokio::test(start_paused = true)]
async fn test_redundant_commands_are_ignored() {
    let (tx, rx) = command_channel();
    let mut acquisition = Acquisition::new(ScriptedThermometer::constant(25.0), config(3), rx);

    // Resume while running is a no-op
    send_after(&tx, Duration::from_millis(500), Command::Resume);
    let report = acquisition.run(std::future::pending::<()>()).await;

    assert_eq!(report.stop_reason, StopReason::QuotaReached);
    assert_close(&elapsed_of(&report), &[0.0, 1.0, 2.0]);
}

#[tokio::test(start_paused = true)]
async fn test_quit_before_first_iteration_records_nothing() {
    let (tx, rx) = command_channel();
    tx.try_send(Command::Quit).unwrap();
    let mut acquisition = Acquisition::new(ScriptedThermometer::constant(25.0), config(180), rx);

    let report = acquisition.run(std::future::pending::<()>()).await;

    assert_eq!(report.stop_reason, StopReason::Quit);
    assert!(report.samples.is_empty());
    assert_eq!(acquisition.into_sensor().reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_quota_does_not_preallocate() {
    let (tx, rx) = command_channel();
    tx.try_send(Command::Quit).unwrap();
    let mut acquisition =
        Acquisition::new(ScriptedThermometer::constant(25.0), config(usize::MAX), rx);

    let report = acquisition.run(std::future::pending::<()>()).await;

    assert_eq!(report.stop_reason, StopReason::Quit);
    assert!(report.samples.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_large_quota_samples_until_quit() {
    let (tx, rx) = command_channel();
    let mut acquisition =
        Acquisition::new(ScriptedThermometer::constant(25.0), config(usize::MAX), rx);

    send_after(&tx, Duration::from_millis(2500), Command::Quit);
    let report = acquisition.run(std::future::pending::<()>()).await;

    assert_eq!(report.stop_reason, StopReason::Quit);
    assert_close(&elapsed_of(&report), &[0.0, 1.0, 2.0]);
}

#[tokio::test(start_paused = true)]
async fn test_closed_command_queue_keeps_running() {
    let (tx, rx) = command_channel();
    drop(tx);
    let mut acquisition = Acquisition::new(ScriptedThermometer::constant(25.0), config(3), rx);

    let report = acquisition.run(std::future::pending::<()>()).await;
    assert_eq!(report.stop_reason, StopReason::QuotaReached);
    assert_eq!(report.samples.len(), 3);
}

// =============================================================================
// Interrupts and failures
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_interrupt_stops_and_keeps_samples() {
    let (_tx, rx) = command_channel();
    let mut acquisition = Acquisition::new(ScriptedThermometer::constant(19.5), config(180), rx);

    let report = acquisition.run(sleep(Duration::from_millis(3500))).await;

    assert_eq!(report.stop_reason, StopReason::Interrupted);
    assert_close(&elapsed_of(&report), &[0.0, 1.0, 2.0, 3.0]);
    assert!(report.sensor_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_while_paused() {
    let (tx, rx) = command_channel();
    let mut acquisition = Acquisition::new(ScriptedThermometer::constant(19.5), config(180), rx);

    send_after(&tx, Duration::from_millis(500), Command::Pause);
    let report = acquisition.run(sleep(Duration::from_secs(10))).await;

    assert_eq!(report.stop_reason, StopReason::Interrupted);
    assert_eq!(report.samples.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_line_failure_stops_acquisition() {
    let (_tx, rx) = command_channel();
    let sensor = ScriptedThermometer::new([
        ScriptStep::Reading(Reading::Celsius(20.0)),
        ScriptStep::Reading(Reading::Celsius(20.25)),
        ScriptStep::LineFailure,
    ]);
    let mut acquisition = Acquisition::new(sensor, config(180), rx);

    let report = acquisition.run(std::future::pending::<()>()).await;

    assert_eq!(report.stop_reason, StopReason::SensorError);
    assert_eq!(report.samples.len(), 2);
    assert!(report.sensor_error.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_event_stream_reports_faults_and_samples() {
    let (_tx, rx) = command_channel();
    let sensor = ScriptedThermometer::new([Reading::OpenCircuit, Reading::Celsius(21.5)]);
    let mut acquisition = Acquisition::new(sensor, config(2), rx);
    let mut events = acquisition.subscribe();

    acquisition.run(std::future::pending::<()>()).await;

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert_eq!(received.first(), Some(&AcquisitionEvent::Started { total_samples: 2 }));
    assert_eq!(
        received.last(),
        Some(&AcquisitionEvent::Stopped(StopReason::QuotaReached))
    );
    let lines: Vec<String> = received.iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        [
            "START",
            "ERROR: Thermocouple disconnected",
            "1.000,21.50",
            "ERROR: Thermocouple disconnected",
            "3.000,21.50",
            "STOP"
        ]
    );
}
