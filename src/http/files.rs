//! Directory and file endpoints

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;

use super::responses::{ApiError, DiskBody, MessageBody, OkBody, PathBody, SizeBody};
use super::{AppState, run_blocking};
use crate::storage::Entry;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub directory: String,
    pub no_folders: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryParams {
    pub directory: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileParams {
    pub file_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameParams {
    pub path: Option<String>,
    pub name: Option<String>,
}

/// A query flag counts as set unless absent, empty, `false` or `0`
fn flag_set(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "false" && v != "0")
}

fn required(value: Option<String>, message: &'static str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::bad_request(message))
}

pub async fn list_files(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let include_folders = !flag_set(params.no_folders.as_deref());
    let tree = state.tree.clone();
    let entries = run_blocking("list", move || tree.list(&params.directory, include_folders)).await?;
    Ok(Json(entries))
}

pub async fn dir_size(
    State(state): State<AppState>,
    Query(params): Query<DirectoryParams>,
) -> Result<Json<SizeBody>, ApiError> {
    let directory = required(params.directory, "directory is required")?;
    let timeout = state.config.startup.dir_size_timeout();
    let tree = state.tree.clone();
    let size = run_blocking("dirsize", move || tree.size(&directory, timeout)).await?;
    Ok(SizeBody::new(size))
}

pub async fn disk_usage(State(state): State<AppState>) -> Result<Json<DiskBody>, ApiError> {
    let tree = state.tree.clone();
    let usage = run_blocking("disk", move || tree.disk_usage()).await?;
    Ok(DiskBody::new(usage.free_bytes, usage.total_bytes))
}

pub async fn create_dir(
    State(state): State<AppState>,
    Query(params): Query<DirectoryParams>,
) -> Result<Json<OkBody>, ApiError> {
    let directory = required(params.directory, "directory is required")?;
    let tree = state.tree.clone();
    run_blocking("createdir", move || tree.create_directory(&directory)).await?;
    Ok(OkBody::new())
}

pub async fn delete_dir(
    State(state): State<AppState>,
    Query(params): Query<DirectoryParams>,
) -> Result<Json<OkBody>, ApiError> {
    let directory = required(params.directory, "directory is required")?;
    let tree = state.tree.clone();
    run_blocking("deletedir", move || tree.delete_directory(&directory)).await?;
    Ok(OkBody::new())
}

pub async fn delete_file(
    State(state): State<AppState>,
    Query(params): Query<FileParams>,
) -> Result<Json<MessageBody>, ApiError> {
    let file_path = required(params.file_path, "filePath is required")?;
    let tree = state.tree.clone();
    run_blocking("deletefile", move || tree.delete_file(&file_path)).await?;
    Ok(MessageBody::new("File deleted"))
}

pub async fn rename(
    State(state): State<AppState>,
    Query(params): Query<RenameParams>,
) -> Result<Json<PathBody>, ApiError> {
    let path = required(params.path, "path and name are required")?;
    let name = required(params.name, "path and name are required")?;
    let tree = state.tree.clone();
    let renamed = run_blocking("rename", move || tree.rename(&path, &name)).await?;
    Ok(PathBody::new(renamed))
}
