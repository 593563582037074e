//! Serves stored files under the static mount.
//!
//! The request path goes through the same containment check as the API.

use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::{AppState, run_blocking};
use crate::error::StorageError;

pub async fn serve(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request,
) -> Response {
    let tree = state.tree.clone();
    let resolved = run_blocking("serve", move || {
        let real_path = tree.resolve(&path)?;
        if real_path.is_file() {
            Ok(real_path)
        } else if real_path.exists() {
            Err(StorageError::NotAFile(path))
        } else {
            Err(StorageError::NotFound(path))
        }
    })
    .await;

    match resolved {
        Ok(real_path) => match ServeFile::new(real_path).oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        },
        Err(e) => e.into_response(),
    }
}
