//! File system storage management
//!
//! The sandboxed directory tree behind the API and the static mount.

pub mod disk;
pub mod operations;
pub mod results;
pub mod validation;

pub use operations::DirectoryTree;
pub use results::{DiskUsage, Entry};
