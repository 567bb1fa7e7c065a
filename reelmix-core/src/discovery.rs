//! File discovery module for finding source videos to process.
//!
//! Only the top level of the input folder is scanned. Recognized extensions
//! are `mp4`, `mov`, `mkv` and `avi` (case-insensitive).

use crate::error::{CoreError, CoreResult};

use std::path::{Path, PathBuf};

/// Extensions accepted as source videos.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["mp4", "mov", "mkv", "avi"];

/// Returns true if `path` has one of the supported video extensions.
#[must_use]
pub fn is_supported_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Outcome of scanning the input folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovered {
    /// The folder has no entries at all.
    Empty,
    /// The folder has entries, none of them supported videos.
    NoSupportedFiles,
    /// Supported videos, sorted by file name.
    Files(Vec<PathBuf>),
}

/// Scans `input_dir` for processable videos.
///
/// # Errors
///
/// * `CoreError::Discovery` - the folder does not exist or cannot be read
///
/// # Examples
///
/// ```rust,no_run
/// use reelmix_core::discovery::{Discovered, scan_input_dir};
/// use std::path::Path;
///
/// match scan_input_dir(Path::new("/videos/input")).unwrap() {
///     Discovered::Files(files) => println!("Found {} videos", files.len()),
///     other => println!("Nothing to do: {other:?}"),
/// }
/// ```
pub fn scan_input_dir(input_dir: &Path) -> CoreResult<Discovered> {
    if !input_dir.is_dir() {
        return Err(CoreError::Discovery(format!(
            "Input folder does not exist: {}",
            input_dir.display()
        )));
    }

    let read_dir = std::fs::read_dir(input_dir).map_err(|e| {
        CoreError::Discovery(format!(
            "Cannot read input folder {}: {}",
            input_dir.display(),
            e
        ))
    })?;

    let mut saw_entry = false;
    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let entry = entry.ok()?;
            saw_entry = true;
            let path = entry.path();
            (path.is_file() && is_supported_video(&path)).then_some(path)
        })
        .collect();

    if files.is_empty() {
        return Ok(if saw_entry {
            Discovered::NoSupportedFiles
        } else {
            Discovered::Empty
        });
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(Discovered::Files(files))
}

/// Convenience wrapper returning only the file list (empty when nothing matched).
pub fn find_processable_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    Ok(match scan_input_dir(input_dir)? {
        Discovered::Files(files) => files,
        Discovered::Empty | Discovered::NoSupportedFiles => Vec::new(),
    })
}
