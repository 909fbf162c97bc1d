//! Configuration System using Figment
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. compiled defaults (the operating parameters of the acquisition)
//! 2. an optional TOML file (`config/thermo_daq.toml` unless another is given)
//! 3. environment variables prefixed with `THERMO_DAQ_`, nested with `__`
//!
//! # Example
//! ```no_run
//! use thermo_daq::config::Settings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // THERMO_DAQ_ACQUISITION__TOTAL_SAMPLES=60 shortens the run to one minute
//! let settings = Settings::load(None)?;
//! settings.validate()?;
//! println!("{} samples", settings.acquisition.total_samples);
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppResult, DaqError};
use crate::hardware::max6675::DEFAULT_SETTLE;
use crate::logging::OutputFormat;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/thermo_daq.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "THERMO_DAQ_";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Application settings
    pub application: ApplicationSettings,
    /// Sensor backend and wiring
    pub sensor: SensorSettings,
    /// Sampling cadence and quota
    pub acquisition: AcquisitionSettings,
    /// Output artifact settings
    pub storage: StorageSettings,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: OutputFormat,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: OutputFormat::Compact,
        }
    }
}

/// Where temperature readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SensorBackend {
    /// Real MAX6675 wired to Linux GPIO lines
    Sysfs,
    /// In-process converter model
    #[default]
    Simulated,
}

impl std::fmt::Display for SensorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorBackend::Sysfs => write!(f, "sysfs"),
            SensorBackend::Simulated => write!(f, "simulated"),
        }
    }
}

/// GPIO numbers of the three bus lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinAssignment {
    /// Clock output
    pub clock: u32,
    /// Chip-select output (idle high)
    pub chip_select: u32,
    /// Serial data input
    pub data: u32,
}

impl Default for PinAssignment {
    fn default() -> Self {
        Self {
            clock: 18,
            chip_select: 5,
            data: 19,
        }
    }
}

/// Simulated converter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Mean temperature in °C
    pub base_celsius: f64,
    /// Half-width of the uniform noise band in °C
    pub noise_celsius: f64,
    /// Probability that a conversion reports an open thermocouple
    pub open_circuit_rate: f64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            base_celsius: 23.0,
            noise_celsius: 0.5,
            open_circuit_rate: 0.0,
            seed: None,
        }
    }
}

/// Sensor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    /// Backend selection
    pub backend: SensorBackend,
    /// Line assignment
    pub pins: PinAssignment,
    /// Settle time after asserting chip-select
    #[serde(with = "humantime_serde")]
    pub settle: Duration,
    /// Simulated converter parameters
    pub simulation: SimulationSettings,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            backend: SensorBackend::default(),
            pins: PinAssignment::default(),
            settle: DEFAULT_SETTLE,
            simulation: SimulationSettings::default(),
        }
    }
}

/// Acquisition loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionSettings {
    /// Time between sample iterations, measured from iteration start
    #[serde(with = "humantime_serde")]
    pub sample_interval: Duration,
    /// Command polling period while paused
    #[serde(with = "humantime_serde")]
    pub pause_poll_interval: Duration,
    /// Number of successful samples after which acquisition stops
    pub total_samples: usize,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(1),
            pause_poll_interval: Duration::from_millis(100),
            total_samples: 180,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory the CSV file is written to
    pub output_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    /// Load settings from an explicit file, or from `config/thermo_daq.toml`
    /// if it exists, plus environment variables.
    ///
    /// An explicitly given file must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        match path {
            Some(p) if !p.exists() => Err(DaqError::Configuration(format!(
                "config file '{}' not found",
                p.display()
            ))),
            Some(p) => Self::load_from(p),
            None => Self::load_from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Layer defaults, the TOML file at `path` (skipped if missing) and
    /// `THERMO_DAQ_*` environment variables.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Ok(Self::figment(path).extract()?)
    }

    fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(DaqError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.acquisition.sample_interval.is_zero() {
            return Err(DaqError::Configuration(
                "acquisition.sample_interval must be greater than zero".into(),
            ));
        }

        if self.acquisition.pause_poll_interval.is_zero() {
            return Err(DaqError::Configuration(
                "acquisition.pause_poll_interval must be greater than zero".into(),
            ));
        }

        if self.acquisition.total_samples == 0 {
            return Err(DaqError::Configuration(
                "acquisition.total_samples must be at least 1".into(),
            ));
        }

        let pins = self.sensor.pins;
        let unique: HashSet<u32> = [pins.clock, pins.chip_select, pins.data].into_iter().collect();
        if unique.len() != 3 {
            return Err(DaqError::Configuration(format!(
                "sensor pins must be distinct (clock={}, chip_select={}, data={})",
                pins.clock, pins.chip_select, pins.data
            )));
        }

        let sim = &self.sensor.simulation;
        if sim.noise_celsius.is_nan() || sim.noise_celsius < 0.0 {
            return Err(DaqError::Configuration(format!(
                "sensor.simulation.noise_celsius must be >= 0, got {}",
                sim.noise_celsius
            )));
        }
        if !(0.0..=1.0).contains(&sim.open_circuit_rate) {
            return Err(DaqError::Configuration(format!(
                "sensor.simulation.open_circuit_rate must be within 0.0..=1.0, got {}",
                sim.open_circuit_rate
            )));
        }

        Ok(())
    }
}
