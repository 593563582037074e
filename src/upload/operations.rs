//! Upload finalization
//!
//! Moves a staged upload into the store under a fresh name. Images are
//! re-encoded, documents are size-checked, everything else is moved as-is.
//! Either the final file exists and the staged copy is gone, or neither
//! exists.

use log::{error, info, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crate::config::UploadConfig;
use crate::error::StorageError;
use crate::storage::DirectoryTree;
use crate::upload::imaging::{ImageKind, ImageProcessor};
use crate::upload::naming::{self, UploadKind};
use crate::upload::staging::StagedUpload;

/// Limits applied while finalizing uploads
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_document_size: u64,
    pub max_image_dimension: u32,
}

impl From<&UploadConfig> for UploadLimits {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_document_size: config.max_document_size_bytes(),
            max_image_dimension: config.max_image_dimension,
        }
    }
}

/// Accepts staged uploads into a [`DirectoryTree`]
#[derive(Clone)]
pub struct UploadReceiver {
    tree: DirectoryTree,
    limits: UploadLimits,
    processor: Arc<dyn ImageProcessor>,
}

impl UploadReceiver {
    pub fn new(tree: DirectoryTree, limits: UploadLimits, processor: Arc<dyn ImageProcessor>) -> Self {
        Self {
            tree,
            limits,
            processor,
        }
    }

    /// Finalizes `staged` into `directory` and returns its store-relative path.
    ///
    /// The staged file is consumed: it is gone when this returns, whatever the outcome.
    pub fn receive_upload(&self, directory: &str, staged: StagedUpload) -> Result<String, StorageError> {
        let target_dir = self.tree.resolve(directory)?;

        if target_dir.exists() && !target_dir.is_dir() {
            return Err(StorageError::NotADirectory(directory.to_string()));
        }
        fs::create_dir_all(&target_dir).map_err(|e| {
            error!(
                "Failed to create upload directory {} (real: {}): {}",
                directory,
                target_dir.display(),
                e
            );
            StorageError::from(e)
        })?;

        let extension = naming::extension_for(staged.original_name(), staged.media_type());
        let final_path = target_dir.join(naming::generate_file_name(&extension));
        let relative_path = self.tree.relative(&final_path)?;

        let kind = naming::classify(&extension);
        let result = match kind {
            UploadKind::Image(image_kind) => self.store_image(&staged, &final_path, image_kind),
            UploadKind::Document => {
                let size = staged.size()?;
                if size > self.limits.max_document_size {
                    warn!(
                        "Rejected document {} for {}: {} bytes exceeds {} bytes",
                        staged.original_name(),
                        directory,
                        size,
                        self.limits.max_document_size
                    );
                    return Err(StorageError::DocumentTooLarge {
                        size,
                        limit: self.limits.max_document_size,
                    });
                }
                move_file(staged.path(), &final_path).map_err(StorageError::from)
            }
            UploadKind::Other => move_file(staged.path(), &final_path).map_err(StorageError::from),
        };

        if let Err(e) = result {
            error!(
                "Failed to store upload {} as {} (real: {}): {}",
                staged.original_name(),
                relative_path,
                final_path.display(),
                e
            );
            return Err(e);
        }

        info!(
            "Stored upload {} ({:?}) as {} (real: {})",
            staged.original_name(),
            kind,
            relative_path,
            final_path.display()
        );
        Ok(relative_path)
    }

    fn store_image(
        &self,
        staged: &StagedUpload,
        final_path: &Path,
        kind: ImageKind,
    ) -> Result<(), StorageError> {
        let bytes = fs::read(staged.path())?;
        let max = self.limits.max_image_dimension;
        let encoded = self.processor.reencode(&bytes, max, max, kind)?;
        write_new(final_path, &encoded)?;
        Ok(())
    }
}

/// Writes a file that must not exist yet. A partial file is removed on failure.
fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let written = file.write_all(bytes).and_then(|_| file.sync_all());
    if written.is_err() {
        let _ = fs::remove_file(path);
    }
    written
}

/// Renames `from` to `to`, copying when they are on different filesystems
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            warn!(
                "Rename {} -> {} failed ({}), falling back to copy",
                from.display(),
                to.display(),
                rename_err
            );
            if let Err(copy_err) = fs::copy(from, to) {
                let _ = fs::remove_file(to);
                return Err(copy_err);
            }
            fs::remove_file(from)
        }
    }
}
