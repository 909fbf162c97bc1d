//! CLI Entry Point for thermo-daq
//!
//! Samples a MAX6675 thermocouple converter at a fixed cadence and writes the
//! run to `temp_<ms-since-boot>.csv` when it ends.
//!
//! While running, type a command and press Enter:
//! - `p` pause
//! - `r` resume
//! - `q` quit (samples collected so far are kept)
//!
//! Ctrl-C stops the run the same way `q` does.
//!
//! # Usage
//!
//! ```bash
//! # Simulated converter, 10 samples
//! thermo-daq --samples 10
//!
//! # Real hardware on the default pins (clock 18, chip-select 5, data 19)
//! thermo-daq --backend sysfs --output-dir runs/
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::error;

use thermo_daq::acquisition::{command_channel, spawn_stdin_reader, Acquisition, AcquisitionConfig};
use thermo_daq::config::{SensorBackend, Settings};
use thermo_daq::data::storage::{millis_since_boot, CsvWriter};
use thermo_daq::session::{banner, print_progress, run_session};
use thermo_daq::{hardware, logging};

#[derive(Parser)]
#[command(name = "thermo-daq")]
#[command(about = "Thermocouple acquisition with pause/resume and CSV export", long_about = None)]
struct Cli {
    /// TOML settings file (defaults to config/thermo_daq.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sensor backend
    #[arg(long, value_enum)]
    backend: Option<SensorBackend>,

    /// Number of samples to collect
    #[arg(long)]
    samples: Option<usize>,

    /// Directory for the CSV file
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(backend) = self.backend {
            settings.sensor.backend = backend;
        }
        if let Some(samples) = self.samples {
            settings.acquisition.total_samples = samples;
        }
        if let Some(dir) = &self.output_dir {
            settings.storage.output_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            settings.application.log_level = level.clone();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply(&mut settings);
    settings.validate()?;
    logging::init_from_settings(&settings).map_err(anyhow::Error::msg)?;

    let writer = CsvWriter::in_dir(&settings.storage.output_dir, millis_since_boot());
    let sensor = hardware::open_thermometer(&settings.sensor)
        .with_context(|| format!("failed to open {} thermometer", settings.sensor.backend))?;

    let (commands_tx, commands_rx) = command_channel();
    spawn_stdin_reader(commands_tx).context("failed to start operator input reader")?;

    let config = AcquisitionConfig::from(&settings.acquisition);
    let mut acquisition = Acquisition::new(sensor, config, commands_rx);
    let printer = tokio::spawn(print_progress(
        acquisition.subscribe(),
        banner(&config, writer.path()),
        std::io::stdout(),
    ));

    let outcome = run_session(&mut acquisition, &writer, interrupt()).await;
    if let Err(e) = printer.await {
        error!(error = %e, "Progress printer failed");
    }

    let outcome = outcome.context("failed to save samples")?;
    match &outcome.output {
        Some(path) => println!("CSV saved as: {}", path.display()),
        None => println!("No data to save."),
    }

    if let Some(e) = outcome.report.sensor_error {
        return Err(e).context("acquisition aborted by a sensor line failure");
    }
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
