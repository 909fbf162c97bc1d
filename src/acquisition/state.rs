//! Run state and operator commands.
//!
//! # State Machine
//!
//! ```text
//!            pause
//! Running ─────────▶ Paused
//!    │   ◀─────────    │
//!    │     resume      │
//!    │                 │
//!    │ quit / quota    │ quit
//!    ▼                 ▼
//!  Stopped ◀───────────┘
//! ```
//!
//! Commands with no edge from the current state are ignored.

use std::str::FromStr;
use thiserror::Error;

/// Operator command, one per input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `p`
    Pause,
    /// `r`
    Resume,
    /// `q`
    Quit,
}

/// Input line that is not a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    /// Tokens are case-sensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "p" => Ok(Command::Pause),
            "r" => Ok(Command::Resume),
            "q" => Ok(Command::Quit),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// Acquisition run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Sampling at the configured cadence
    #[default]
    Running,
    /// Polling commands only
    Paused,
    /// Terminal
    Stopped,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Running => write!(f, "running"),
            RunState::Paused => write!(f, "paused"),
            RunState::Stopped => write!(f, "stopped"),
        }
    }
}

impl RunState {
    /// State after `command`, or `None` if the command is a no-op here.
    pub fn on_command(self, command: Command) -> Option<RunState> {
        match (self, command) {
            (RunState::Running, Command::Pause) => Some(RunState::Paused),
            (RunState::Paused, Command::Resume) => Some(RunState::Running),
            (RunState::Running | RunState::Paused, Command::Quit) => Some(RunState::Stopped),
            _ => None,
        }
    }

    /// True once no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        self == RunState::Stopped
    }
}

/// Why acquisition ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The sample quota was reached
    QuotaReached,
    /// The operator entered `q`
    Quit,
    /// An interrupt signal arrived
    Interrupted,
    /// A digital line could not be accessed
    SensorError,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::QuotaReached => write!(f, "sample quota reached"),
            StopReason::Quit => write!(f, "operator quit"),
            StopReason::Interrupted => write!(f, "interrupted"),
            StopReason::SensorError => write!(f, "sensor error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tokens() {
        assert_eq!("p".parse::<Command>(), Ok(Command::Pause));
        assert_eq!("  r\n".parse::<Command>(), Ok(Command::Resume));
        assert_eq!("q\r\n".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_other_input() {
        assert!("P".parse::<Command>().is_err());
        assert!("quit".parse::<Command>().is_err());
        assert_eq!("".parse::<Command>(), Err(UnknownCommand(String::new())));
    }

    #[test]
    fn transition_table() {
        use Command::*;
        use RunState::*;

        assert_eq!(Running.on_command(Pause), Some(Paused));
        assert_eq!(Paused.on_command(Resume), Some(Running));
        assert_eq!(Running.on_command(Quit), Some(Stopped));
        assert_eq!(Paused.on_command(Quit), Some(Stopped));

        assert_eq!(Paused.on_command(Pause), None);
        assert_eq!(Running.on_command(Resume), None);
        assert_eq!(Stopped.on_command(Resume), None);
        assert_eq!(Stopped.on_command(Quit), None);
    }

    #[test]
    fn stopped_is_terminal() {
        assert!(RunState::Stopped.is_terminal());
        assert!(!RunState::Paused.is_terminal());
        assert_eq!(RunState::default(), RunState::Running);
    }
}
