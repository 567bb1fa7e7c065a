//! Reporter that records everything it receives, for assertions in tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{BatchStartInfo, FileProgressContext, Reporter};
use crate::progress::{BatchSummary, ProgressSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    Line(String),
    Warning(String),
    BatchStarted(usize),
    FileStarted(String),
    FileFailed { file_name: String, message: String },
    Progress(ProgressSnapshot),
    ReviewRequested(PathBuf),
    BatchComplete(BatchSummary),
}

#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RecordedEvent::Line(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RecordedEvent::Warning(w) => Some(w),
                _ => None,
            })
            .collect()
    }

    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RecordedEvent::Progress(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn summary(&self) -> Option<BatchSummary> {
        self.events().into_iter().rev().find_map(|e| match e {
            RecordedEvent::BatchComplete(s) => Some(s),
            _ => None,
        })
    }

    /// True if any log line contains `needle`.
    pub fn has_line(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    fn push(&self, event: RecordedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn log_line(&self, line: &str) {
        self.push(RecordedEvent::Line(line.to_string()));
    }

    fn warning(&self, message: &str) {
        self.push(RecordedEvent::Warning(message.to_string()));
    }

    fn batch_started(&self, info: &BatchStartInfo) {
        self.push(RecordedEvent::BatchStarted(info.total_files));
    }

    fn file_started(&self, context: &FileProgressContext) {
        self.push(RecordedEvent::FileStarted(context.file_name.clone()));
    }

    fn file_failed(&self, file_name: &str, message: &str) {
        self.push(RecordedEvent::FileFailed {
            file_name: file_name.to_string(),
            message: message.to_string(),
        });
    }

    fn progress(&self, snapshot: &ProgressSnapshot) {
        self.push(RecordedEvent::Progress(snapshot.clone()));
    }

    fn review_requested(&self, folder: &Path) {
        self.push(RecordedEvent::ReviewRequested(folder.to_path_buf()));
    }

    fn batch_complete(&self, summary: &BatchSummary) {
        self.push(RecordedEvent::BatchComplete(summary.clone()));
    }
}
