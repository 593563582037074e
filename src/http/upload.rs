//! Multipart upload endpoint
//!
//! Streams every `files` part into the staging area, then hands each staged
//! file to the [`UploadReceiver`](crate::upload::UploadReceiver) in order.
//! The target directory comes from `directory` (empty means the store root),
//! or from the legacy `project` + `folder` pair when `directory` is absent.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Json;
use log::{debug, info};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::responses::ApiError;
use super::{AppState, run_blocking};
use crate::error::UploadError;
use crate::upload::{StagedUpload, StagingArea};

const FILES_FIELD: &str = "files";
const DIRECTORY_FIELD: &str = "directory";
const PROJECT_FIELD: &str = "project";
const FOLDER_FIELD: &str = "folder";

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Fields collected from one upload request
#[derive(Debug, Default)]
pub struct UploadForm {
    pub directory: Option<String>,
    pub project: Option<String>,
    pub folder: Option<String>,
    pub files: Vec<StagedUpload>,
}

impl UploadForm {
    /// Single target directory for the request. A `directory` field wins over
    /// `project`/`folder` even when empty, which targets the store root.
    pub fn target_directory(&self) -> Result<String, UploadError> {
        if let Some(directory) = &self.directory {
            return Ok(directory.trim().to_string());
        }

        let project = non_empty(&self.project).ok_or(UploadError::MissingDirectory)?;
        Ok(match non_empty(&self.folder) {
            Some(folder) => format!("{}/{}", project, folder),
            None => project.to_string(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn upload_files(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Vec<String>>, ApiError> {
    let limit = state.config.upload.max_upload_size_bytes();
    let form = read_form(multipart, &state.staging, limit)
        .await
        .map_err(|e| ApiError::upload(&e))?;

    let directory = form.target_directory().map_err(|e| ApiError::upload(&e))?;
    if form.files.is_empty() {
        return Err(ApiError::upload(&UploadError::NoFiles));
    }

    let mut urls = Vec::with_capacity(form.files.len());
    for staged in form.files {
        let uploads = state.uploads.clone();
        let target = directory.clone();
        let stored = run_blocking("upload", move || uploads.receive_upload(&target, staged)).await?;
        urls.push(state.config.startup.public_url(&stored));
    }

    info!("Upload to {} stored {} file(s)", directory, urls.len());
    Ok(Json(urls))
}

/// Reads the whole form, staging file parts as they stream in.
///
/// Any staged file is removed again if reading fails part way.
pub async fn read_form(
    mut multipart: Multipart,
    staging: &StagingArea,
    max_file_size: u64,
) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();
    let to_upload_error = |e: MultipartError| multipart_error(e, max_file_size);

    while let Some(field) = multipart.next_field().await.map_err(to_upload_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILES_FIELD) => {
                let staged = stage_field(field, staging, max_file_size).await?;
                form.files.push(staged);
            }
            Some(DIRECTORY_FIELD) => {
                form.directory = Some(field.text().await.map_err(to_upload_error)?)
            }
            Some(PROJECT_FIELD) => form.project = Some(field.text().await.map_err(to_upload_error)?),
            Some(FOLDER_FIELD) => form.folder = Some(field.text().await.map_err(to_upload_error)?),
            other => {
                debug!("Ignoring form field {:?}", other);
                drain(field, max_file_size).await?;
            }
        }
    }

    Ok(form)
}

async fn stage_field(
    mut field: Field<'_>,
    staging: &StagingArea,
    max_file_size: u64,
) -> Result<StagedUpload, UploadError> {
    let original_name = field.file_name().unwrap_or_default().to_string();
    let media_type = field.content_type().unwrap_or(DEFAULT_MEDIA_TYPE).to_string();
    let staged = staging.stage(&original_name, &media_type);

    let mut file = File::create(staged.path()).await?;
    let mut size: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, max_file_size))?
    {
        size = size.saturating_add(chunk.len() as u64);
        if size > max_file_size {
            return Err(UploadError::FileTooLarge {
                limit: max_file_size,
            });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    debug!(
        "Staged {} ({}, {} bytes) at {}",
        original_name,
        media_type,
        size,
        staged.path().display()
    );
    Ok(staged)
}

async fn drain(mut field: Field<'_>, max_file_size: u64) -> Result<(), UploadError> {
    while field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, max_file_size))?
        .is_some()
    {}
    Ok(())
}

fn multipart_error(e: MultipartError, limit: u64) -> UploadError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::FileTooLarge { limit }
    } else {
        UploadError::MalformedRequest(e.body_text())
    }
}
