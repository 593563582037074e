//! JSON bodies and the error response type shared by all handlers

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use log::{error, warn};
use serde::Serialize;

use crate::error::handlers::{
    auth_error_to_status, error_message, error_to_status, handle_error, upload_error_message,
    upload_error_to_status,
};
use crate::error::{AuthError, StorageError, UploadError};

const STATUS_OK: &str = "ok";
const STATUS_ERROR: &str = "error";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OkBody {
    pub status: &'static str,
}

impl OkBody {
    pub fn new() -> Json<Self> {
        Json(Self { status: STATUS_OK })
    }
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub status: &'static str,
    pub message: &'static str,
}

impl MessageBody {
    pub fn new(message: &'static str) -> Json<Self> {
        Json(Self {
            status: STATUS_OK,
            message,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SizeBody {
    pub status: &'static str,
    pub size: u64,
}

impl SizeBody {
    pub fn new(size: u64) -> Json<Self> {
        Json(Self {
            status: STATUS_OK,
            size,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DiskBody {
    pub status: &'static str,
    pub free: u64,
    pub total: u64,
}

impl DiskBody {
    pub fn new(free: u64, total: u64) -> Json<Self> {
        Json(Self {
            status: STATUS_OK,
            free,
            total,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PathBody {
    pub status: &'static str,
    pub path: String,
}

impl PathBody {
    pub fn new(path: String) -> Json<Self> {
        Json(Self {
            status: STATUS_OK,
            path,
        })
    }
}

/// Body of login/logout responses
#[derive(Debug, Serialize)]
pub struct AuthOkBody {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthStatusBody {
    pub authenticated: bool,
}

/// An error response: status code plus a generic, client-safe message.
///
/// Details are logged where the error is built and never sent to the client.
#[derive(Debug, Clone, Copy)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    pub fn bad_request(message: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    }

    pub fn storage(operation: &str, err: &StorageError) -> Self {
        handle_error(operation, err);
        Self::new(error_to_status(err), error_message(err))
    }

    pub fn upload(err: &UploadError) -> Self {
        if let UploadError::Storage(e) = err {
            return Self::storage("upload", e);
        }
        warn!("upload rejected: {}", err);
        Self::new(upload_error_to_status(err), upload_error_message(err))
    }

    pub fn auth(err: &AuthError) -> Self {
        let status = auth_error_to_status(err);
        if status.is_server_error() {
            error!("auth failed: {}", err);
            Self::new(status, "Login is not configured")
        } else {
            warn!("auth rejected: {}", err);
            Self::new(status, "Unauthorized")
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: STATUS_ERROR,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
