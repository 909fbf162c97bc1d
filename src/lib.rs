//! # thermo-daq
//!
//! Single-channel thermocouple acquisition. A MAX6675 converter is read over a
//! bit-banged 3-wire interface once per sampling interval; the operator can
//! pause, resume or quit from stdin, and the collected samples are written to
//! a CSV file when the run ends.
//!
//! ## Crate Structure
//!
//! - **`hardware`**: digital line capability traits, the MAX6675 driver, the
//!   Linux sysfs GPIO backend and a simulated converter.
//! - **`acquisition`**: the Running/Paused/Stopped loop, active-time
//!   bookkeeping and the operator command queue.
//! - **`data`**: the sample model and CSV export.
//! - **`session`**: runs the loop and writes its output once.
//! - **`config`**: layered settings (defaults, TOML, environment).
//! - **`logging`**: `tracing` subscriber setup.
//! - **`error`**: the crate-wide `DaqError`.

pub mod acquisition;
pub mod config;
pub mod data;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod session;
