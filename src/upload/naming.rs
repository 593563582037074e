//! Destination naming for uploads
//!
//! Every stored upload gets a fresh UUID file name so names never collide.
//! The extension comes from the original file name, then the declared media
//! type, then falls back to `bin`.

use std::path::Path;
use uuid::Uuid;

use crate::upload::imaging::ImageKind;

pub const FALLBACK_EXTENSION: &str = "bin";

const MAX_EXTENSION_LEN: usize = 10;

const MEDIA_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/pjpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("image/svg+xml", "svg"),
    ("image/heic", "heic"),
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    ("application/vnd.ms-excel", "xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    ("application/vnd.ms-powerpoint", "ppt"),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "pptx",
    ),
    ("application/zip", "zip"),
    ("application/json", "json"),
    ("text/plain", "txt"),
    ("text/csv", "csv"),
    ("video/mp4", "mp4"),
    ("video/quicktime", "mov"),
    ("audio/mpeg", "mp3"),
];

const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];

/// How an upload is finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Decoded, downscaled and re-encoded
    Image(ImageKind),
    /// Size-limited, then moved verbatim
    Document,
    /// Moved verbatim
    Other,
}

/// Picks the stored extension for an upload, lower-cased and without the dot
pub fn extension_for(original_name: &str, media_type: &str) -> String {
    if let Some(ext) = original_extension(original_name) {
        return ext;
    }

    let media_type = media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    MEDIA_TYPE_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == media_type)
        .map(|(_, ext)| (*ext).to_string())
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

fn original_extension(original_name: &str) -> Option<String> {
    // Browsers may send a full client path; only the last segment matters
    let base = original_name.rsplit(['/', '\\']).next()?;
    let ext = Path::new(base).extension()?.to_str()?;

    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

/// A fresh collision-proof file name with the given extension
pub fn generate_file_name(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension)
}

pub fn classify(extension: &str) -> UploadKind {
    if let Some(kind) = ImageKind::from_extension(extension) {
        UploadKind::Image(kind)
    } else if DOCUMENT_EXTENSIONS.contains(&extension) {
        UploadKind::Document
    } else {
        UploadKind::Other
    }
}
