//! Working folders and scratch files.
//!
//! Per-file working folders (`_segments/<name>`, `_direct/<name>`,
//! `_normalized/<name>`) live at fixed paths inside the output folder and are
//! handled by [`ScopedDir`]. Short-lived scratch files (concat
//! lists, fingerprint frames) use the tempfile crate in the system temp dir.
//! Both are removed on drop, including on error paths.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

use crate::error::CoreResult;

/// Folder at a fixed path that is deleted recursively when dropped.
#[derive(Debug)]
pub struct ScopedDir {
    path: PathBuf,
}

impl ScopedDir {
    /// Creates (or reuses) `path`, taking ownership of its cleanup.
    pub fn create(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        debug!("Created working folder {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed working folder {}", self.path.display()),
            Err(e) => warn!(
                "Failed to remove working folder {}: {}",
                self.path.display(),
                e
            ),
        }
        // Drop the empty `_segments` / `_direct` parent as well
        if let Some(parent) = self.path.parent() {
            let _ = fs::remove_dir(parent);
        }
    }
}

/// Scratch file `<prefix>_XXXX.<extension>` in `dir`, removed when the handle drops.
pub fn create_temp_file(dir: &Path, prefix: &str, extension: &str) -> CoreResult<NamedTempFile> {
    fs::create_dir_all(dir)?;
    let file = TempFileBuilder::new()
        .prefix(&format!("{prefix}_"))
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?;

    Ok(file)
}

/// Same as [`create_temp_file`], in the system temporary directory.
pub fn create_temp_file_in_system_dir(prefix: &str, extension: &str) -> CoreResult<NamedTempFile> {
    create_temp_file(&std::env::temp_dir(), prefix, extension)
}
