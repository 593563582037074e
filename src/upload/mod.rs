//! Upload handling
//!
//! Staging, naming, image re-encoding and finalization of uploaded files.

pub mod imaging;
pub mod naming;
pub mod operations;
pub mod staging;

pub use imaging::{ImageCrateProcessor, ImageKind, ImageProcessor};
pub use operations::{UploadLimits, UploadReceiver};
pub use staging::{StagedUpload, StagingArea};
