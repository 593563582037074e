//! Error handlers
//!
//! Maps domain errors to HTTP status codes and client-safe messages.

use crate::error::types::{AuthError, StorageError, UploadError};
use axum::http::StatusCode;
use log::{error, warn};

/// Log a storage error with the operation that produced it
pub fn handle_error(operation: &str, err: &StorageError) {
    match err {
        StorageError::IoError(_) | StorageError::Timeout(_) => {
            error!("{} failed: {}", operation, err)
        }
        _ => warn!("{} rejected: {}", operation, err),
    }
}

/// Convert a storage error to an HTTP status code
pub fn error_to_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::PathEscape(_) => StatusCode::BAD_REQUEST,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::NotADirectory(_) => StatusCode::BAD_REQUEST,
        StorageError::NotAFile(_) => StatusCode::BAD_REQUEST,
        StorageError::InvalidName(_) => StatusCode::BAD_REQUEST,
        StorageError::Conflict(_) => StatusCode::CONFLICT,
        StorageError::DocumentTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        StorageError::InvalidImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StorageError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        StorageError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        StorageError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Generic message for a storage error. Never includes paths or OS error text.
pub fn error_message(err: &StorageError) -> &'static str {
    match err {
        StorageError::PathEscape(_) => "Invalid path",
        StorageError::NotFound(_) => "Not found",
        StorageError::NotADirectory(_) => "Not a directory",
        StorageError::NotAFile(_) => "Not a file",
        StorageError::InvalidName(_) => "Invalid name",
        StorageError::Conflict(_) => "An entry with that name already exists",
        StorageError::DocumentTooLarge { .. } => "Document too large",
        StorageError::InvalidImage(_) => "Image could not be processed",
        StorageError::Timeout(_) => "Operation timed out",
        StorageError::Unsupported(_) => "Not supported on this server",
        StorageError::IoError(_) => "Internal error",
    }
}

pub fn upload_error_to_status(err: &UploadError) -> StatusCode {
    match err {
        UploadError::MalformedRequest(_) | UploadError::MissingDirectory | UploadError::NoFiles => {
            StatusCode::BAD_REQUEST
        }
        UploadError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        UploadError::Storage(e) => error_to_status(e),
    }
}

pub fn upload_error_message(err: &UploadError) -> &'static str {
    match err {
        UploadError::MalformedRequest(_) => "Malformed upload request",
        UploadError::MissingDirectory => "directory is required",
        UploadError::NoFiles => "No files uploaded",
        UploadError::FileTooLarge { .. } => "File too large",
        UploadError::Storage(e) => error_message(e),
    }
}

pub fn auth_error_to_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::PasswordNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        AuthError::InvalidPassword | AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
    }
}
