//! Disk usage of the filesystem containing the store root

use std::path::Path;

use crate::error::StorageError;
use crate::storage::results::DiskUsage;

#[cfg(any(unix, windows))]
pub fn disk_usage(path: &Path) -> Result<DiskUsage, StorageError> {
    let free_bytes = fs2::available_space(path).map_err(unsupported_or_io)?;
    let total_bytes = fs2::total_space(path).map_err(unsupported_or_io)?;
    Ok(DiskUsage {
        free_bytes,
        total_bytes,
    })
}

#[cfg(not(any(unix, windows)))]
pub fn disk_usage(_path: &Path) -> Result<DiskUsage, StorageError> {
    Err(StorageError::Unsupported("disk usage".into()))
}

#[cfg(any(unix, windows))]
fn unsupported_or_io(e: std::io::Error) -> StorageError {
    if e.kind() == std::io::ErrorKind::Unsupported {
        StorageError::Unsupported("disk usage".into())
    } else {
        StorageError::IoError(e)
    }
}
