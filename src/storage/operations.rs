//! Storage operations
//!
//! The directory tree service: list, size, create, delete and rename entries
//! below a single store root. Every operation resolves its path through
//! [`resolve_in_root`] first and never touches anything outside the root.

use log::{error, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use crate::error::StorageError;
use crate::storage::disk;
use crate::storage::results::{DiskUsage, Entry};
use crate::storage::validation::{relative_to_root, resolve_in_root, validate_entry_name};

const REMOVE_RETRIES: u32 = 3;

/// Sandboxed CRUD over one store root
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    root: PathBuf,
}

impl DirectoryTree {
    /// Opens the store at `root`, creating it if needed.
    pub fn open(root: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        info!("Store root: {}", root.display());
        Ok(Self { root })
    }

    /// Canonical absolute store root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a store-relative path, failing `PathEscape` if it would leave the root
    pub fn resolve(&self, relative_path: &str) -> Result<PathBuf, StorageError> {
        resolve_in_root(&self.root, relative_path)
    }

    /// Store-relative form of an absolute path inside the root
    pub fn relative(&self, absolute: &Path) -> Result<String, StorageError> {
        relative_to_root(&self.root, absolute)
    }

    /// Lists the immediate children of `directory`, sorted by name.
    ///
    /// A directory that does not exist lists as empty.
    pub fn list(&self, directory: &str, include_folders: bool) -> Result<Vec<Entry>, StorageError> {
        let real_path = self.resolve(directory)?;

        let read_dir = match fs::read_dir(&real_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) if e.kind() == io::ErrorKind::NotADirectory => {
                return Err(StorageError::NotADirectory(directory.to_string()));
            }
            Err(_) if real_path.is_file() => {
                return Err(StorageError::NotADirectory(directory.to_string()));
            }
            Err(e) => {
                error!(
                    "Failed to list directory {} (real: {}): {}",
                    directory,
                    real_path.display(),
                    e
                );
                return Err(StorageError::from(e));
            }
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);

            if !is_file && !include_folders {
                continue;
            }

            let size = if is_file {
                match entry.metadata() {
                    Ok(metadata) => metadata.len(),
                    Err(e) => {
                        warn!("No metadata for {}: {}", entry.path().display(), e);
                        0
                    }
                }
            } else {
                0
            };

            entries.push(Entry {
                name,
                is_file,
                size,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            "Listed directory {} (real: {}) - {} entries",
            directory,
            real_path.display(),
            entries.len()
        );

        Ok(entries)
    }

    /// Sums the sizes of all regular files below `directory`.
    ///
    /// Symlinks below `directory` are skipped. Fails `Timeout` once `timeout`
    /// has elapsed.
    pub fn size(&self, directory: &str, timeout: Duration) -> Result<u64, StorageError> {
        let real_path = self.resolve(directory)?;

        let metadata = match fs::metadata(&real_path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(directory.to_string()));
            }
            Err(e) => return Err(StorageError::from(e)),
        };
        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(directory.to_string()));
        }

        let deadline = Instant::now() + timeout;
        let total = walk_size(&real_path, deadline).map_err(|e| {
            if let StorageError::Timeout(_) = e {
                StorageError::Timeout(directory.to_string())
            } else {
                error!(
                    "Failed to size directory {} (real: {}): {}",
                    directory,
                    real_path.display(),
                    e
                );
                e
            }
        })?;

        info!(
            "Sized directory {} (real: {}) - {} bytes",
            directory,
            real_path.display(),
            total
        );
        Ok(total)
    }

    /// Creates `directory` and any missing ancestors. Succeeds if it already exists.
    pub fn create_directory(&self, directory: &str) -> Result<(), StorageError> {
        let real_path = self.resolve(directory)?;

        if real_path.exists() && !real_path.is_dir() {
            return Err(StorageError::NotADirectory(directory.to_string()));
        }

        fs::create_dir_all(&real_path).map_err(|e| {
            error!(
                "Failed to create directory {} (real: {}): {}",
                directory,
                real_path.display(),
                e
            );
            StorageError::from(e)
        })?;

        info!(
            "Created directory {} (real: {})",
            directory,
            real_path.display()
        );
        Ok(())
    }

    /// Removes `directory` and everything under it. The root itself is refused.
    pub fn delete_directory(&self, directory: &str) -> Result<(), StorageError> {
        let real_path = self.resolve(directory)?;

        if real_path == self.root {
            return Err(StorageError::PathEscape("store root cannot be deleted".into()));
        }
        if !real_path.exists() {
            return Err(StorageError::NotFound(directory.to_string()));
        }
        if !real_path.is_dir() {
            return Err(StorageError::NotADirectory(directory.to_string()));
        }

        with_retries(|| fs::remove_dir_all(&real_path)).map_err(|e| {
            error!(
                "Failed to delete directory {} (real: {}): {}",
                directory,
                real_path.display(),
                e
            );
            StorageError::from(e)
        })?;

        info!(
            "Deleted directory {} (real: {})",
            directory,
            real_path.display()
        );
        Ok(())
    }

    /// Removes a single file
    pub fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let real_path = self.resolve(path)?;

        // Verify file exists
        let metadata = match fs::symlink_metadata(&real_path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.to_string()));
            }
            Err(e) => return Err(StorageError::from(e)),
        };
        if metadata.is_dir() {
            return Err(StorageError::NotAFile(path.to_string()));
        }

        with_retries(|| fs::remove_file(&real_path)).map_err(|e| {
            error!(
                "Failed to delete file {} (real: {}): {}",
                path,
                real_path.display(),
                e
            );
            StorageError::from(e)
        })?;

        info!("Deleted file {} (real: {})", path, real_path.display());
        Ok(())
    }

    /// Renames the entry at `path` to `new_name` within the same parent.
    ///
    /// Returns the new store-relative path. An existing entry with the new
    /// name is never overwritten.
    pub fn rename(&self, path: &str, new_name: &str) -> Result<String, StorageError> {
        let new_name = new_name.trim();
        validate_entry_name(new_name)?;

        let source = self.resolve(path)?;
        if source == self.root {
            return Err(StorageError::PathEscape("store root cannot be renamed".into()));
        }
        if fs::symlink_metadata(&source).is_err() {
            return Err(StorageError::NotFound(path.to_string()));
        }

        let parent = source
            .parent()
            .ok_or_else(|| StorageError::PathEscape(path.to_string()))?;
        let target = parent.join(new_name);
        let target_relative = self.relative(&target)?;

        if target == source {
            return Ok(target_relative);
        }
        if fs::symlink_metadata(&target).is_ok() {
            return Err(StorageError::Conflict(target_relative));
        }

        fs::rename(&source, &target).map_err(|e| {
            error!(
                "Failed to rename {} (real: {}) to {}: {}",
                path,
                source.display(),
                target.display(),
                e
            );
            StorageError::from(e)
        })?;

        info!(
            "Renamed {} to {} (real: {})",
            path,
            target_relative,
            target.display()
        );
        Ok(target_relative)
    }

    /// Free and total space of the filesystem holding the store root
    pub fn disk_usage(&self) -> Result<DiskUsage, StorageError> {
        disk::disk_usage(&self.root)
    }
}

fn walk_size(start: &Path, deadline: Instant) -> Result<u64, StorageError> {
    let mut total = 0u64;

    for entry in WalkDir::new(start).follow_links(false) {
        if Instant::now() >= deadline {
            return Err(StorageError::Timeout(start.display().to_string()));
        }

        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            total += entry.metadata().map_err(io::Error::from)?.len();
        }
    }

    Ok(total)
}

/// Retries an operation that failed with `PermissionDenied`, which is
/// transient while another process holds the file open on some platforms.
fn with_retries<F>(mut op: F) -> io::Result<()>
where
    F: FnMut() -> io::Result<()>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(()) => return Ok(()),
            Err(e) if attempt < REMOVE_RETRIES && e.kind() == io::ErrorKind::PermissionDenied => {
                thread::sleep(Duration::from_millis(100 * attempt as u64));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
