//! Interactive run control over stdin.
//!
//! One command per line: `p` pauses, `r` resumes, `q` cancels and an empty
//! line continues after manual review. When stdin closes, the review latch is
//! closed so later reviews never block.

use log::{debug, info, warn};
use reelmix_core::{ResumeLatch, RunControl};
use std::io::{self, BufRead};
use std::thread;

/// Parsed control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    Cancel,
    Continue,
}

pub fn parse_command(line: &str) -> Option<ControlCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "pause" => Some(ControlCommand::Pause),
        "r" | "resume" => Some(ControlCommand::Resume),
        "q" | "quit" => Some(ControlCommand::Cancel),
        "" => Some(ControlCommand::Continue),
        _ => None,
    }
}

/// Applies commands read from `reader` until it ends or the run is cancelled.
pub fn read_commands<R: BufRead>(reader: R, control: &RunControl, latch: &ResumeLatch) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Stopped reading control input: {}", e);
                break;
            }
        };
        match parse_command(&line) {
            Some(ControlCommand::Pause) => {
                info!("Pause requested");
                control.pause();
            }
            Some(ControlCommand::Resume) => {
                info!("Resume requested");
                control.resume();
            }
            Some(ControlCommand::Cancel) => {
                info!("Cancel requested");
                control.cancel();
                break;
            }
            Some(ControlCommand::Continue) => latch.release(),
            None => debug!("Ignoring control input '{}'", line.trim()),
        }
    }
    latch.close();
}

/// Reads stdin on a background thread for the lifetime of the process.
pub fn spawn_stdin_control(control: RunControl, latch: ResumeLatch) {
    let fallback = latch.clone();
    let spawned = thread::Builder::new()
        .name("stdin-control".to_string())
        .spawn(move || read_commands(io::stdin().lock(), &control, &latch));
    if let Err(e) = spawned {
        warn!("Could not start the control thread: {}", e);
        fallback.close();
    }
}
