//! Timed, operator-controlled acquisition.
//!
//! - [`state`]: run states, commands and the transition table
//! - [`timing`]: active elapsed time with paused intervals excluded
//! - [`engine`]: the sampling loop
//! - [`input`]: stdin reader feeding the single-slot command queue

pub mod engine;
pub mod input;
pub mod state;
pub mod timing;

pub use engine::{Acquisition, AcquisitionConfig, AcquisitionEvent, AcquisitionReport};
pub use input::{command_channel, spawn_stdin_reader};
pub use state::{Command, RunState, StopReason};
pub use timing::ActiveClock;
