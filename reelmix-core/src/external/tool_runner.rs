// ============================================================================
// reelmix-core/src/external/tool_runner.rs
// ============================================================================
//
// TOOL RUNNER: Supervised Execution of External Processes
//
// The ToolRunner trait is the dependency-injection seam for every ffmpeg and
// ffprobe call. ProcessRunner is the production implementation: it spawns the
// binary, drains stdout and stderr on helper threads and polls for exit on a
// short fixed interval so pause and cancel are observed promptly.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, trace};

use crate::context::RunContext;
use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};

/// Interval between exit polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// One fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Short tool name used in errors and logs ("ffmpeg", "ffprobe").
    pub tool: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// File the command is expected to produce, if any.
    pub output: Option<PathBuf>,
}

impl ToolInvocation {
    pub fn new(tool: impl Into<String>, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args,
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Command line rendered for logs.
    pub fn display_command(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(' ') {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

/// Runs external tools under the run's pause and cancel signals.
pub trait ToolRunner: Send + Sync {
    /// Runs `invocation` to completion.
    ///
    /// Returns captured standard output, or standard error when standard
    /// output is empty. Fails with `Cancelled` if the run is cancelled while
    /// the process is alive, and with `ToolFailure` on a non-zero exit that
    /// wrote error output.
    fn run(&self, invocation: &ToolInvocation, ctx: &RunContext) -> CoreResult<String>;
}

/// ToolRunner backed by `std::process`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    poll_interval: Duration,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
        }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

fn kill_child(child: &mut Child, tool: &str) {
    if let Err(e) = child.kill() {
        debug!("Failed to kill {}: {}", tool, e);
    }
    let _ = child.wait();
}

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation, ctx: &RunContext) -> CoreResult<String> {
        ctx.checkpoint()?;
        debug!("Running: {}", invocation.display_command());

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_start_error(invocation.tool.clone(), e))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if ctx.is_cancelled() {
                kill_child(&mut child, &invocation.tool);
                // Grandchildren may hold the pipes open; leave the readers detached
                drop((stdout, stderr));
                return Err(CoreError::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if ctx.wait_until_runnable().is_err() {
                        // Cancelled while paused; the next tick kills the child
                        continue;
                    }
                    thread::sleep(self.poll_interval);
                }
                Err(e) => {
                    kill_child(&mut child, &invocation.tool);
                    return Err(CoreError::Io(e));
                }
            }
        };

        let out = collect(stdout);
        let err = collect(stderr);
        trace!("{} exited with {}", invocation.tool, status);

        if !status.success() && !err.trim().is_empty() {
            return Err(command_failed_error(invocation.tool.clone(), status, &err));
        }

        Ok(if out.trim().is_empty() { err } else { out })
    }
}
