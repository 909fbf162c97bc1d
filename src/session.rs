//! One acquisition session: run the loop, then write the samples once.
//!
//! Also owns the console progress stream: `START`, the run banner, then one
//! line per event until `STOP`.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info};

use crate::acquisition::{Acquisition, AcquisitionConfig, AcquisitionEvent, AcquisitionReport};
use crate::data::CsvWriter;
use crate::error::AppResult;
use crate::hardware::capabilities::Thermometer;

/// What a session produced.
#[derive(Debug)]
pub struct SessionOutcome {
    /// Loop result, including the samples
    pub report: AcquisitionReport,
    /// Written CSV file, `None` if nothing was recorded
    pub output: Option<PathBuf>,
}

/// Run `acquisition` to completion and write its samples with `writer`.
///
/// An empty run writes nothing. A write failure is returned as an error.
pub async fn run_session<T, F>(
    acquisition: &mut Acquisition<T>,
    writer: &CsvWriter,
    interrupt: F,
) -> AppResult<SessionOutcome>
where
    T: Thermometer,
    F: Future,
{
    let report = acquisition.run(interrupt).await;

    if report.samples.is_empty() {
        info!("No samples recorded, skipping CSV output");
        return Ok(SessionOutcome {
            report,
            output: None,
        });
    }

    if let Err(e) = writer.write(report.samples.as_slice()) {
        error!(
            error = %e,
            path = %writer.path().display(),
            samples = report.samples.len(),
            "Failed to write CSV"
        );
        return Err(e);
    }

    Ok(SessionOutcome {
        report,
        output: Some(writer.path().to_path_buf()),
    })
}

/// Banner printed right after `START`.
pub fn banner(config: &AcquisitionConfig, output: &Path) -> Vec<String> {
    let total_seconds = config.sample_interval.as_secs_f64() * config.total_samples as f64;
    vec![
        format!(
            "Duration: {:.0} s ({} samples every {:?})",
            total_seconds, config.total_samples, config.sample_interval
        ),
        format!("Output file: {}", output.display()),
        "Press 'p' to pause, 'r' to resume, 'q' to quit".to_string(),
    ]
}

/// Write one console line per event to `out` until the run stops.
///
/// `banner` follows the `START` line.
pub async fn print_progress<W: Write>(
    mut events: broadcast::Receiver<AcquisitionEvent>,
    banner: Vec<String>,
    mut out: W,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Progress printer lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let mut lines = vec![event.to_string()];
        if matches!(event, AcquisitionEvent::Started { .. }) {
            lines.extend(banner.iter().cloned());
        }
        for line in &lines {
            if let Err(e) = writeln!(out, "{line}") {
                error!(error = %e, "Console output closed");
                return;
            }
        }

        if matches!(event, AcquisitionEvent::Stopped(_)) {
            break;
        }
    }
}
