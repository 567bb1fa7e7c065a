//! Reporting seam between the pipeline and whoever displays it.
//!
//! The pipeline talks to a [`Reporter`] for every user-visible message and
//! progress update. The terminal and JSON implementations live here, so
//! front-ends only have to pick one.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::progress::{BatchSummary, ProgressSnapshot};
use crate::utils::{format_duration, format_eta};

#[cfg(test)]
mod recording;

#[cfg(test)]
pub use recording::{RecordedEvent, RecordingReporter};

/// What the batch is about to process.
#[derive(Clone, Debug)]
pub struct BatchStartInfo {
    pub total_files: usize,
    pub file_list: Vec<String>,
    pub output_dir: String,
    pub mode: String,
}

/// Which input is being worked on.
#[derive(Clone, Debug)]
pub struct FileProgressContext {
    /// 1-based position of the file in the batch.
    pub current_file: usize,
    pub total_files: usize,
    pub file_name: String,
}

/// Observer for pipeline output. Every method defaults to a no-op.
pub trait Reporter: Send + Sync {
    /// One user-visible log line.
    fn log_line(&self, _line: &str) {}
    fn warning(&self, _message: &str) {}
    fn batch_started(&self, _info: &BatchStartInfo) {}
    fn file_started(&self, _context: &FileProgressContext) {}
    fn file_failed(&self, _file_name: &str, _message: &str) {}
    fn progress(&self, _snapshot: &ProgressSnapshot) {}
    /// The segment folder is ready for manual review.
    fn review_requested(&self, _folder: &Path) {}
    fn batch_complete(&self, _summary: &BatchSummary) {}
}

/// Reporter that ignores everything.
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Inputs listed by name when a batch starts.
const LISTED_FILES: usize = 20;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Human-friendly reporter: plain log lines plus a bar over input files.
pub struct TerminalReporter {
    progress: Mutex<Option<ProgressBar>>,
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            progress: Mutex::new(None),
        }
    }

    fn print(&self, line: &str) {
        match lock(&self.progress).as_ref() {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }

    fn clear_bar(&self) {
        if let Some(pb) = lock(&self.progress).take() {
            pb.finish_and_clear();
        }
    }

    fn ensure_bar(&self, total: usize) {
        let mut guard = lock(&self.progress);
        if guard.is_some() {
            return;
        }
        let pb = ProgressBar::new(total as u64);
        let bar_style = ProgressStyle::default_bar()
            .template("Videos [{bar:40}] {pos}/{len} | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(bar_style);
        *guard = Some(pb);
    }
}

impl Reporter for TerminalReporter {
    fn log_line(&self, line: &str) {
        self.print(line);
    }

    fn warning(&self, message: &str) {
        self.print(&style(format!("WARN: {}", message)).yellow().bold().to_string());
    }

    fn batch_started(&self, info: &BatchStartInfo) {
        println!("\n{}", style("RUN").bold().cyan());
        println!(
            "  Processing {} files ({}) -> {}",
            info.total_files,
            info.mode,
            style(&info.output_dir).bold()
        );
        for (idx, name) in info.file_list.iter().enumerate().take(LISTED_FILES) {
            println!("  {:>3}  {}", idx + 1, name);
        }
        if info.file_list.len() > LISTED_FILES {
            println!("  ... and {} more", info.file_list.len() - LISTED_FILES);
        }
        println!();
    }

    fn file_started(&self, context: &FileProgressContext) {
        self.ensure_bar(context.total_files);
        if let Some(pb) = lock(&self.progress).as_ref() {
            pb.set_message(context.file_name.clone());
        }
    }

    fn file_failed(&self, file_name: &str, message: &str) {
        self.print(&format!(
            "{} {}: {}",
            style("ERROR").red().bold(),
            file_name,
            message
        ));
    }

    fn progress(&self, snapshot: &ProgressSnapshot) {
        if let Some(pb) = lock(&self.progress).as_ref() {
            pb.set_position(snapshot.processed_inputs as u64);
            if let Some(eta) = snapshot.estimated_remaining {
                pb.set_message(format!("eta ~{}", format_eta(eta)));
            }
        }
    }

    fn review_requested(&self, folder: &Path) {
        self.print(&format!(
            "\n{} {}",
            style("REVIEW").bold().magenta(),
            style(folder.display()).bold()
        ));
    }

    fn batch_complete(&self, summary: &BatchSummary) {
        self.clear_bar();
        println!("\n{}", style("SUMMARY").bold().cyan());
        println!(
            "  {}",
            style(format!(
                "{} of {} succeeded",
                summary.succeeded, summary.total_inputs
            ))
            .bold()
        );
        if summary.failed > 0 {
            println!("  Failed: {}", style(summary.failed.to_string()).red());
        }
        if summary.skipped > 0 {
            println!("  Skipped: {}", style(summary.skipped.to_string()).yellow());
        }
        println!("  Outputs: {}", summary.generated_outputs);
        println!(
            "  Time: {}",
            format_duration(summary.elapsed.as_secs_f64())
        );
    }
}

/// Line-delimited JSON reporter for machine consumers.
pub struct JsonReporter {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporter {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn emit(&self, value: serde_json::Value) {
        let mut writer = lock(&self.writer);
        let _ = writeln!(writer, "{}", value);
        let _ = writer.flush();
    }
}

impl Reporter for JsonReporter {
    fn log_line(&self, line: &str) {
        self.emit(json!({
            "type": "log",
            "message": line,
            "timestamp": Self::unix_now(),
        }));
    }

    fn warning(&self, message: &str) {
        self.emit(json!({
            "type": "warning",
            "message": message,
            "timestamp": Self::unix_now(),
        }));
    }

    fn batch_started(&self, info: &BatchStartInfo) {
        self.emit(json!({
            "type": "batch_started",
            "total_files": info.total_files,
            "files": info.file_list,
            "output_dir": info.output_dir,
            "mode": info.mode,
            "timestamp": Self::unix_now(),
        }));
    }

    fn file_started(&self, context: &FileProgressContext) {
        self.emit(json!({
            "type": "file_started",
            "current_file": context.current_file,
            "total_files": context.total_files,
            "file_name": context.file_name,
            "timestamp": Self::unix_now(),
        }));
    }

    fn file_failed(&self, file_name: &str, message: &str) {
        self.emit(json!({
            "type": "file_failed",
            "file_name": file_name,
            "message": message,
            "timestamp": Self::unix_now(),
        }));
    }

    fn progress(&self, snapshot: &ProgressSnapshot) {
        self.emit(json!({
            "type": "progress",
            "total_inputs": snapshot.total_inputs,
            "processed_inputs": snapshot.processed_inputs,
            "failed_inputs": snapshot.failed_inputs,
            "total_outputs": snapshot.total_outputs,
            "generated_outputs": snapshot.generated_outputs,
            "eta_seconds": snapshot.estimated_remaining.map(|d| d.as_secs()),
            "timestamp": Self::unix_now(),
        }));
    }

    fn review_requested(&self, folder: &Path) {
        self.emit(json!({
            "type": "review_requested",
            "folder": folder.display().to_string(),
            "timestamp": Self::unix_now(),
        }));
    }

    fn batch_complete(&self, summary: &BatchSummary) {
        self.emit(json!({
            "type": "batch_complete",
            "total_inputs": summary.total_inputs,
            "succeeded": summary.succeeded,
            "failed": summary.failed,
            "skipped": summary.skipped,
            "generated_outputs": summary.generated_outputs,
            "elapsed_seconds": summary.elapsed.as_secs(),
            "timestamp": Self::unix_now(),
        }));
    }
}
