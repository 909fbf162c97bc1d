//! Acquisition loop.
//!
//! One iteration:
//! 1. take at most one operator command from the queue (non-blocking)
//! 2. if running, read the thermometer and record the sample or the fault
//! 3. sleep until the next iteration, racing the interrupt signal
//!
//! The interval is measured from iteration start. The loop is the only
//! writer of the sample sequence and the run state.
//!
//! # Usage
//!
//! ```rust,ignore
//! let (tx, rx) = command_channel();
//! let mut acquisition = Acquisition::new(sensor, AcquisitionConfig::default(), rx);
//! let mut events = acquisition.subscribe();
//!
//! let report = acquisition.run(tokio::signal::ctrl_c()).await;
//! println!("{} samples, stopped: {}", report.samples.len(), report.stop_reason);
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use super::state::{Command, RunState, StopReason};
use super::timing::ActiveClock;
use crate::config::AcquisitionSettings;
use crate::data::{Sample, SampleSequence};
use crate::hardware::capabilities::{LineError, Reading, Thermometer};

/// Capacity of the event broadcast channel.
const EVENT_CAPACITY: usize = 256;

/// Upper bound on samples allocated up front; larger quotas grow on demand.
const PREALLOCATED_SAMPLES: usize = 4096;

/// Loop timing and quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Time between sample iterations
    pub sample_interval: Duration,
    /// Command polling period while paused
    pub pause_poll_interval: Duration,
    /// Successful samples after which the run stops
    pub total_samples: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self::from(&AcquisitionSettings::default())
    }
}

impl From<&AcquisitionSettings> for AcquisitionConfig {
    fn from(settings: &AcquisitionSettings) -> Self {
        Self {
            sample_interval: settings.sample_interval,
            pause_poll_interval: settings.pause_poll_interval,
            total_samples: settings.total_samples,
        }
    }
}

/// Progress notifications published while the loop runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionEvent {
    /// Loop entered `Running`
    Started {
        /// Configured quota
        total_samples: usize,
    },
    /// A sample was recorded
    Sample(Sample),
    /// The converter reported an open thermocouple
    Fault {
        /// Active time of the failed read
        elapsed_seconds: f64,
    },
    /// Entered `Paused`
    Paused,
    /// Left `Paused`
    Resumed {
        /// Length of the pause
        paused_for: Duration,
    },
    /// Entered `Stopped`
    Stopped(StopReason),
}

impl std::fmt::Display for AcquisitionEvent {
    /// Console progress line.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquisitionEvent::Started { .. } => write!(f, "START"),
            AcquisitionEvent::Sample(sample) => write!(f, "{sample}"),
            AcquisitionEvent::Fault { .. } => write!(f, "ERROR: Thermocouple disconnected"),
            AcquisitionEvent::Paused => write!(f, "PAUSED"),
            AcquisitionEvent::Resumed { .. } => write!(f, "RESUMED"),
            AcquisitionEvent::Stopped(_) => write!(f, "STOP"),
        }
    }
}

/// Result of one run.
#[derive(Debug)]
pub struct AcquisitionReport {
    /// Recorded samples in acquisition order
    pub samples: SampleSequence,
    /// Why the loop ended
    pub stop_reason: StopReason,
    /// Open-circuit reads skipped
    pub faults: usize,
    /// Line failure that ended the run, if any
    pub sensor_error: Option<LineError>,
}

/// Single-channel acquisition controller.
pub struct Acquisition<T> {
    sensor: T,
    config: AcquisitionConfig,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<AcquisitionEvent>,
    state: RunState,
}

impl<T: Thermometer> Acquisition<T> {
    /// Create a controller reading `sensor` and taking commands from `commands`.
    pub fn new(sensor: T, config: AcquisitionConfig, commands: mpsc::Receiver<Command>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            sensor,
            config,
            commands,
            events,
            state: RunState::Running,
        }
    }

    /// Subscribe to progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<AcquisitionEvent> {
        self.events.subscribe()
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Loop configuration.
    pub fn config(&self) -> AcquisitionConfig {
        self.config
    }

    /// Give the sensor back.
    pub fn into_sensor(self) -> T {
        self.sensor
    }

    /// Run until the quota is reached, `q` is received, the sensor fails or
    /// `interrupt` completes.
    ///
    /// `interrupt` is only observed while sleeping between iterations.
    pub async fn run<F>(&mut self, interrupt: F) -> AcquisitionReport
    where
        F: Future,
    {
        tokio::pin!(interrupt);

        let quota = self.config.total_samples;
        let mut clock = ActiveClock::new(Instant::now());
        let mut samples = SampleSequence::with_capacity(quota.min(PREALLOCATED_SAMPLES));
        let mut faults = 0usize;
        let mut sensor_error = None;

        self.state = RunState::Running;
        info!(
            total_samples = quota,
            interval_ms = self.config.sample_interval.as_millis() as u64,
            "Acquisition started"
        );
        self.emit(AcquisitionEvent::Started {
            total_samples: quota,
        });

        let stop_reason = loop {
            if samples.len() >= quota {
                break StopReason::QuotaReached;
            }

            let iteration_start = Instant::now();
            if let Some(reason) = self.poll_command(&mut clock, iteration_start) {
                break reason;
            }

            let wake_at = match self.state {
                RunState::Running => {
                    let elapsed = clock.elapsed(iteration_start).as_secs_f64();
                    match self.sensor.read() {
                        Ok(Reading::Celsius(celsius)) => {
                            let sample = Sample::new(elapsed, celsius);
                            samples.push(sample);
                            debug!(elapsed, celsius, count = samples.len(), "Sample recorded");
                            self.emit(AcquisitionEvent::Sample(sample));
                            if samples.len() >= quota {
                                break StopReason::QuotaReached;
                            }
                        }
                        Ok(Reading::OpenCircuit) => {
                            faults += 1;
                            warn!(elapsed, faults, "Thermocouple disconnected");
                            self.emit(AcquisitionEvent::Fault {
                                elapsed_seconds: elapsed,
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Sensor read failed, stopping acquisition");
                            sensor_error = Some(e);
                            break StopReason::SensorError;
                        }
                    }
                    iteration_start + self.config.sample_interval
                }
                RunState::Paused => iteration_start + self.config.pause_poll_interval,
                RunState::Stopped => break StopReason::Quit,
            };

            tokio::select! {
                _ = sleep_until(wake_at) => {}
                _ = &mut interrupt => {
                    info!("Interrupt received");
                    break StopReason::Interrupted;
                }
            }
        };

        self.state = RunState::Stopped;
        info!(
            reason = %stop_reason,
            samples = samples.len(),
            faults,
            "Acquisition stopped"
        );
        self.emit(AcquisitionEvent::Stopped(stop_reason));

        AcquisitionReport {
            samples,
            stop_reason,
            faults,
            sensor_error,
        }
    }

    /// Apply at most one queued command. Returns a stop reason on quit.
    fn poll_command(&mut self, clock: &mut ActiveClock, now: Instant) -> Option<StopReason> {
        let command = match self.commands.try_recv() {
            Ok(command) => command,
            // An empty or closed queue leaves the state unchanged
            Err(_) => return None,
        };

        let Some(next) = self.state.on_command(command) else {
            debug!(?command, state = %self.state, "Ignoring command");
            return None;
        };

        match next {
            RunState::Paused => {
                clock.pause(now);
                info!(elapsed_s = clock.elapsed(now).as_secs_f64(), "Acquisition paused");
                self.state = next;
                self.emit(AcquisitionEvent::Paused);
                None
            }
            RunState::Running => {
                let paused_for = clock.resume(now).unwrap_or_default();
                info!(paused_ms = paused_for.as_millis() as u64, "Acquisition resumed");
                self.state = next;
                self.emit(AcquisitionEvent::Resumed { paused_for });
                None
            }
            RunState::Stopped => {
                self.state = next;
                Some(StopReason::Quit)
            }
        }
    }

    fn emit(&self, event: AcquisitionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl<T> std::fmt::Debug for Acquisition<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acquisition")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
