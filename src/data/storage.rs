//! CSV export of acquired samples.
//!
//! The whole sequence is written once, synchronously, when acquisition ends:
//!
//! ```text
//! time_seconds,temperature_C
//! 0.998,23.25
//! 1.999,23.50
//! ```
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::data::sample::Sample;
use crate::error::AppResult;

/// Header row of the output file.
pub const CSV_HEADER: [&str; 2] = ["time_seconds", "temperature_C"];

/// Output file name for a run started `boot_millis` milliseconds after boot.
pub fn output_file_name(boot_millis: u64) -> String {
    format!("temp_{boot_millis}.csv")
}

/// Milliseconds since the system booted.
///
/// Read from `/proc/uptime`. Where that is unavailable, milliseconds since
/// the Unix epoch are used so names stay unique between runs.
pub fn millis_since_boot() -> u64 {
    match fs::read_to_string("/proc/uptime")
        .ok()
        .as_deref()
        .and_then(parse_uptime_millis)
    {
        Some(ms) => ms,
        None => {
            debug!("/proc/uptime unavailable, naming output by wall clock");
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default()
        }
    }
}

/// Parse the first field of `/proc/uptime` ("12345.67 54321.00") into ms.
fn parse_uptime_millis(contents: &str) -> Option<u64> {
    let seconds: f64 = contents.split_whitespace().next()?.parse().ok()?;
    if seconds.is_finite() && seconds >= 0.0 {
        Some((seconds * 1000.0).round() as u64)
    } else {
        None
    }
}

/// Serialize `samples` as CSV into any writer.
pub fn write_samples<W: Write>(writer: W, samples: &[Sample]) -> AppResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;
    for sample in samples {
        csv_writer.write_record(&[
            format!("{:.3}", sample.elapsed_seconds),
            format!("{:.2}", sample.temperature_celsius),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// A writer for the run's CSV file.
#[derive(Debug, Clone)]
pub struct CsvWriter {
    path: PathBuf,
}

impl CsvWriter {
    /// Write to exactly `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write `temp_<boot_millis>.csv` inside `dir`.
    pub fn in_dir(dir: &Path, boot_millis: u64) -> Self {
        Self::new(dir.join(output_file_name(boot_millis)))
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file (and missing parent directories) and write all samples.
    pub fn write(&self, samples: &[Sample]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&self.path)?;
        write_samples(file, samples)?;
        info!(path = %self.path.display(), samples = samples.len(), "CSV written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_samples_exact_format() {
        let samples = [Sample::new(0.998, 23.25), Sample::new(1.999, 23.50)];
        let mut buf = Vec::new();
        write_samples(&mut buf, &samples).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "time_seconds,temperature_C\n0.998,23.25\n1.999,23.50\n"
        );
    }

    #[test]
    fn test_write_samples_rounds() {
        let samples = [Sample::new(3.0004, 0.0), Sample::new(10.12349, 1023.75)];
        let mut buf = Vec::new();
        write_samples(&mut buf, &samples).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows, ["3.000,0.00", "10.123,1023.75"]);
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(123456), "temp_123456.csv");
    }

    #[test]
    fn test_parse_uptime() {
        assert_eq!(parse_uptime_millis("350735.47 234388.90\n"), Some(350_735_470));
        assert_eq!(parse_uptime_millis("0.50 0.10"), Some(500));
        assert_eq!(parse_uptime_millis(""), None);
        assert_eq!(parse_uptime_millis("abc 1"), None);
    }

    #[test]
    fn test_writer_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CsvWriter::in_dir(&dir.path().join("runs/today"), 42);
        writer.write(&[Sample::new(0.0, 20.0)]).unwrap();

        let text = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(text, "time_seconds,temperature_C\n0.000,20.00\n");
        assert!(writer.path().ends_with("temp_42.csv"));
    }
}
