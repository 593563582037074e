//! Staging area for incoming uploads
//!
//! Uploaded bytes land in a staging file first. [`StagedUpload`] owns that
//! file and removes it when dropped, so every early return and error path
//! leaves nothing behind in staging.

use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory holding in-flight uploads
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Opens the staging directory, creating it if needed
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        info!("Staging directory: {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserves a fresh staging file for an upload. Nothing is created on disk yet.
    pub fn stage(&self, original_name: &str, media_type: &str) -> StagedUpload {
        let path = self.dir.join(format!("{}.part", Uuid::new_v4()));
        StagedUpload::new(path, original_name, media_type)
    }
}

/// An uploaded file waiting to be validated and finalized
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    original_name: String,
    media_type: String,
}

impl StagedUpload {
    pub fn new(path: PathBuf, original_name: &str, media_type: &str) -> Self {
        Self {
            path,
            original_name: original_name.to_string(),
            media_type: media_type.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Size of the staged file in bytes
    pub fn size(&self) -> io::Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed staged file {}", self.path.display()),
            // Already moved into the store
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove staged file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
