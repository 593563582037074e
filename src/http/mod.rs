//! HTTP surface
//!
//! Maps query parameters and multipart forms onto [`DirectoryTree`] and
//! [`UploadReceiver`] calls, and their results onto status codes and JSON.

pub mod auth;
pub mod files;
pub mod responses;
pub mod static_files;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{delete, get, post};
use axum::{Router, middleware};
use log::{error, warn};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::ServerConfig;
use crate::error::{ServerError, StorageError};
use crate::middleware::{log_requests, require_auth};
use crate::storage::DirectoryTree;
use crate::upload::{ImageCrateProcessor, StagingArea, UploadLimits, UploadReceiver};
use responses::ApiError;

/// Room for multipart headers and text fields on top of the file size cap
const FORM_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub tree: DirectoryTree,
    pub uploads: UploadReceiver,
    pub staging: StagingArea,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Opens the store root and staging directory, creating them if needed.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let tree = DirectoryTree::open(&config.startup.store_root_path())?;
        let staging = StagingArea::open(&config.startup.staging_dir_path())?;
        let processor = Arc::new(ImageCrateProcessor::new(config.upload.jpeg_quality));
        let uploads = UploadReceiver::new(tree.clone(), UploadLimits::from(&config.upload), processor);

        Ok(Self {
            tree,
            uploads,
            staging,
            config: Arc::new(config),
        })
    }
}

/// Builds the full application router
pub fn build_router(state: AppState) -> Router {
    let startup = &state.config.startup;

    let protected = Router::new()
        .route("/api/files", get(files::list_files))
        .route("/api/dirsize", get(files::dir_size))
        .route("/api/disk", get(files::disk_usage))
        .route("/api/createdir", post(files::create_dir))
        .route("/api/deletedir", delete(files::delete_dir))
        .route(
            "/api/deletefile",
            get(files::delete_file).delete(files::delete_file),
        )
        .route("/api/rename", post(files::rename))
        .route("/api", post(upload::upload_files))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route(
            &format!("{}/*path", startup.static_mount()),
            get(static_files::serve),
        );

    let body_limit = state
        .config
        .upload
        .max_upload_size_bytes()
        .saturating_add(FORM_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let mut app = protected
        .merge(public)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(log_requests));

    if let Some(cors) = cors_layer(&startup.allowed_origins) {
        app = app.layer(cors);
    }

    app.with_state(state)
}

/// CORS for the configured origins. No origins, no layer.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            // Credentials are allowed, so wildcards are not
            Ok(value) if origin != "*" => Some(value),
            _ => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

/// Runs a blocking storage call off the async runtime
pub(crate) async fn run_blocking<T, F>(operation: &'static str, task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ApiError::storage(operation, &e)),
        Err(e) => {
            error!("{} task failed: {}", operation, e);
            Err(ApiError::internal())
        }
    }
}
