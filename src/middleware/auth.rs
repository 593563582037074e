//! Cookie gate for the protected API routes

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;

use crate::auth::validate_cookie;
use crate::http::AppState;
use crate::http::responses::ApiError;

pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    match validate_cookie(&jar, &state.config.startup) {
        Ok(()) => next.run(request).await,
        Err(e) => ApiError::auth(&e).into_response(),
    }
}
