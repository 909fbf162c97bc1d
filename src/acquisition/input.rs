//! Operator input.
//!
//! Reading stdin blocks, so lines are read on a dedicated OS thread and
//! forwarded as [`Command`]s through a single-slot queue. The acquisition
//! loop drains at most one command per iteration with `try_recv`.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::state::Command;

/// Depth of the command queue.
pub const COMMAND_QUEUE_DEPTH: usize = 1;

/// Create the single-slot command queue.
pub fn command_channel() -> (mpsc::Sender<Command>, mpsc::Receiver<Command>) {
    mpsc::channel(COMMAND_QUEUE_DEPTH)
}

/// Forward commands read from `reader` until EOF, a read error, or the
/// receiver is dropped. Unrecognized lines are skipped.
///
/// Blocks the calling thread; do not call from an async context.
pub fn forward_commands<R: BufRead>(reader: R, commands: &mpsc::Sender<Command>) -> usize {
    let mut forwarded = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Operator input closed");
                break;
            }
        };

        match line.parse::<Command>() {
            Ok(command) => {
                if commands.blocking_send(command).is_err() {
                    break;
                }
                forwarded += 1;
            }
            Err(e) => debug!(error = %e, "Ignoring operator input"),
        }
    }
    forwarded
}

/// Spawn the stdin reader thread.
pub fn spawn_stdin_reader(commands: mpsc::Sender<Command>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("operator-input".into())
        .spawn(move || {
            let stdin = io::stdin();
            let forwarded = forward_commands(stdin.lock(), &commands);
            debug!(forwarded, "Operator input reader finished");
        })
}
