//! Storage result types
//!
//! Defines result structures returned by storage operations.

use serde::Serialize;

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    pub is_file: bool,
    /// File size in bytes, 0 for anything that is not a regular file
    pub size: u64,
}

/// Space on the filesystem holding the store root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub free_bytes: u64,
    pub total_bytes: u64,
}
