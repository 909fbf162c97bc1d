//! Thermocouple Capabilities
//!
//! The converter driver is written against the `embedded-hal` 1.0 digital
//! and delay traits, so any GPIO backend works:
//!
//! - the clock and chip-select lines implement [`OutputPin`]
//! - the serial-data line implements [`InputPin`]
//! - the settle wait after asserting chip-select is a [`DelayNs`]
//!
//! Pin errors are backend specific; the driver folds them into [`LineError`]
//! so a sensor can be used as a `dyn` [`Thermometer`], which is what the
//! acquisition loop consumes.
//!
//! # Design Philosophy
//!
//! - Synchronous (a 16-bit transfer is a tight loop, not a suspension point)
//! - A disconnected thermocouple is a [`Reading`], not an error
//!
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

use embedded_hal::digital::{Error as PinError, ErrorKind};
use thiserror::Error;

/// Errors raised while claiming, driving or sampling a digital line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    /// The line could not be claimed or configured.
    #[error("Line '{line}' unavailable: {reason}")]
    Unavailable {
        /// Line name (e.g. "clock", "chip_select")
        line: String,
        /// Human readable cause
        reason: String,
    },

    /// The pin backend failed to drive or sample the line.
    #[error("Pin error on line '{line}' ({kind:?}): {detail}")]
    Pin {
        /// Line name
        line: String,
        /// Backend-independent classification
        kind: ErrorKind,
        /// Backend error, formatted
        detail: String,
    },
}

impl LineError {
    /// Wrap a backend pin error raised on `line`.
    pub fn pin<E: PinError>(line: &str, err: E) -> Self {
        LineError::Pin {
            line: line.to_string(),
            kind: err.kind(),
            detail: format!("{err:?}"),
        }
    }

    /// Name of the line that failed.
    pub fn line(&self) -> &str {
        match self {
            LineError::Unavailable { line, .. } | LineError::Pin { line, .. } => line,
        }
    }
}

/// Outcome of a single thermocouple conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// A valid temperature in degrees Celsius.
    Celsius(f64),
    /// The converter flagged an open thermocouple input.
    OpenCircuit,
}

impl Reading {
    /// Temperature in °C, or `None` for a fault.
    pub fn celsius(&self) -> Option<f64> {
        match self {
            Reading::Celsius(t) => Some(*t),
            Reading::OpenCircuit => None,
        }
    }
}

/// Capability: Temperature Source
///
/// Anything the acquisition loop can sample. A disconnected probe is a
/// [`Reading::OpenCircuit`] value; `Err` is reserved for line access failures.
pub trait Thermometer {
    /// Perform one conversion.
    fn read(&mut self) -> Result<Reading, LineError>;
}

impl<T: Thermometer + ?Sized> Thermometer for Box<T> {
    fn read(&mut self) -> Result<Reading, LineError> {
        (**self).read()
    }
}
