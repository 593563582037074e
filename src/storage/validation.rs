//! Path validation
//!
//! Resolves store-relative paths to absolute paths and enforces that every
//! resolved path stays inside the store root.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;

/// Splits a store-relative path into validated segments.
///
/// Empty and `.` segments are dropped, so `""`, `"."` and `"a/"` are fine.
/// Absolute paths, `..` segments, backslashes and NUL bytes are rejected.
pub fn normalize_relative_path(relative_path: &str) -> Result<Vec<&str>, StorageError> {
    if relative_path.contains('\0') {
        return Err(StorageError::PathEscape(relative_path.escape_default().to_string()));
    }

    if relative_path.starts_with('/') || relative_path.starts_with('\\') {
        return Err(StorageError::PathEscape(relative_path.to_string()));
    }

    let mut segments = Vec::new();
    for segment in relative_path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if !is_plain_segment(segment) {
            return Err(StorageError::PathEscape(relative_path.to_string()));
        }
        segments.push(segment);
    }

    Ok(segments)
}

/// Validates a single entry name used by rename
pub fn validate_entry_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name == "." || !is_plain_segment(name) {
        return Err(StorageError::InvalidName(name.escape_default().to_string()));
    }
    Ok(())
}

/// A segment must be exactly one normal path component on this platform.
/// This rules out `..`, drive prefixes such as `C:` and embedded separators.
fn is_plain_segment(segment: &str) -> bool {
    if segment.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Resolves `relative_path` against the canonical `root`.
///
/// The full path, leaf included, must stay inside `root` once symlinks are
/// followed. The returned path has its parent canonicalized but keeps the
/// leaf name as given, so a symlink leaf is acted on as the link itself.
pub fn resolve_in_root(root: &Path, relative_path: &str) -> Result<PathBuf, StorageError> {
    let segments = normalize_relative_path(relative_path)?;
    contained_in_root(root, &segments, relative_path)?;

    match segments.split_last() {
        None => Ok(root.to_path_buf()),
        Some((leaf, parents)) => {
            let mut resolved = contained_in_root(root, parents, relative_path)?;
            resolved.push(leaf);
            Ok(resolved)
        }
    }
}

/// Canonicalizes the deepest existing ancestor of `segments` and checks it is
/// `root` or a descendant, compared component by component. Segments below it
/// that do not exist yet are appended as-is.
fn contained_in_root(
    root: &Path,
    segments: &[&str],
    relative_path: &str,
) -> Result<PathBuf, StorageError> {
    for existing in (0..=segments.len()).rev() {
        let mut candidate = root.to_path_buf();
        candidate.extend(&segments[..existing]);

        let canonical = match candidate.canonicalize() {
            Ok(path) => path,
            Err(e) => match fs::symlink_metadata(&candidate) {
                // Nothing at this depth yet, try the parent
                Err(_) => continue,
                // A dangling symlink could be created through later on
                Ok(meta) if meta.file_type().is_symlink() => {
                    return Err(StorageError::PathEscape(relative_path.to_string()));
                }
                Ok(_) => return Err(StorageError::IoError(e)),
            },
        };

        if !canonical.starts_with(root) {
            return Err(StorageError::PathEscape(relative_path.to_string()));
        }

        let mut resolved = canonical;
        resolved.extend(&segments[existing..]);
        return Ok(resolved);
    }

    Err(StorageError::IoError(io::Error::new(
        io::ErrorKind::NotFound,
        format!("store root {} is missing", root.display()),
    )))
}

/// Converts an absolute path inside `root` back to a `/`-separated relative path
pub fn relative_to_root(root: &Path, absolute: &Path) -> Result<String, StorageError> {
    let relative = absolute
        .strip_prefix(root)
        .map_err(|_| StorageError::PathEscape(absolute.display().to_string()))?;

    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(segments.join("/"))
}
