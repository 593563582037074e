//! Error types
//!
//! Defines domain-specific error types for each module of the server.

use std::fmt;
use std::io;

/// Directory tree errors
#[derive(Debug)]
pub enum StorageError {
    /// The path would resolve outside the store root
    PathEscape(String),
    NotFound(String),
    NotADirectory(String),
    NotAFile(String),
    InvalidName(String),
    /// An entry with the requested name already exists
    Conflict(String),
    DocumentTooLarge { size: u64, limit: u64 },
    InvalidImage(ImageError),
    /// Directory walk exceeded its deadline
    Timeout(String),
    /// The platform lacks the required primitive
    Unsupported(String),
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::PathEscape(p) => write!(f, "Path escapes store root: {}", p),
            StorageError::NotFound(p) => write!(f, "Not found: {}", p),
            StorageError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            StorageError::NotAFile(p) => write!(f, "Not a file: {}", p),
            StorageError::InvalidName(n) => write!(f, "Invalid name: {}", n),
            StorageError::Conflict(p) => write!(f, "Already exists: {}", p),
            StorageError::DocumentTooLarge { size, limit } => {
                write!(f, "Document too large: {} bytes (limit {} bytes)", size, limit)
            }
            StorageError::InvalidImage(e) => write!(f, "Invalid image: {}", e),
            StorageError::Timeout(p) => write!(f, "Timed out walking: {}", p),
            StorageError::Unsupported(what) => write!(f, "Unsupported on this platform: {}", what),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(e) => Some(e),
            StorageError::InvalidImage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

impl From<ImageError> for StorageError {
    fn from(error: ImageError) -> Self {
        StorageError::InvalidImage(error)
    }
}

/// Image re-encoding errors
#[derive(Debug)]
pub enum ImageError {
    UnsupportedFormat(String),
    DecodeError(String),
    EncodeError(String),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::UnsupportedFormat(s) => write!(f, "Unsupported image format: {}", s),
            ImageError::DecodeError(s) => write!(f, "Failed to decode image: {}", s),
            ImageError::EncodeError(s) => write!(f, "Failed to encode image: {}", s),
        }
    }
}

impl std::error::Error for ImageError {}

/// Authentication errors
#[derive(Debug)]
pub enum AuthError {
    /// No password is configured, so nobody can log in
    PasswordNotConfigured,
    InvalidPassword,
    NotAuthenticated,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::PasswordNotConfigured => write!(f, "App password is not configured"),
            AuthError::InvalidPassword => write!(f, "Invalid password"),
            AuthError::NotAuthenticated => write!(f, "Not authenticated"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Upload request errors raised while staging multipart bodies
#[derive(Debug)]
pub enum UploadError {
    MalformedRequest(String),
    MissingDirectory,
    NoFiles,
    FileTooLarge { limit: u64 },
    Storage(StorageError),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::MalformedRequest(s) => write!(f, "Malformed upload request: {}", s),
            UploadError::MissingDirectory => write!(f, "No target directory given"),
            UploadError::NoFiles => write!(f, "No files in upload request"),
            UploadError::FileTooLarge { limit } => {
                write!(f, "Uploaded file exceeds {} bytes", limit)
            }
            UploadError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for UploadError {}

impl From<StorageError> for UploadError {
    fn from(error: StorageError) -> Self {
        UploadError::Storage(error)
    }
}

impl From<io::Error> for UploadError {
    fn from(error: io::Error) -> Self {
        UploadError::Storage(StorageError::IoError(error))
    }
}

/// Top-level error for server startup
#[derive(Debug)]
pub enum ServerError {
    Config(config::ConfigError),
    Storage(StorageError),
    IoError(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::Storage(e) => write!(f, "Storage error: {}", e),
            ServerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<StorageError> for ServerError {
    fn from(error: StorageError) -> Self {
        ServerError::Storage(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::IoError(error)
    }
}
