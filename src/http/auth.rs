//! Login, logout and session status

use axum::extract::State;
use axum::response::Json;
use axum_extra::extract::CookieJar;
use log::info;
use serde::Deserialize;

use super::AppState;
use super::responses::{ApiError, AuthOkBody, AuthStatusBody};
use crate::auth::{login_cookie, logout_cookie, validate_cookie, validate_password};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthOkBody>), ApiError> {
    let startup = &state.config.startup;
    validate_password(&request.password, startup).map_err(|e| ApiError::auth(&e))?;

    info!("Login succeeded");
    let cookie = login_cookie(&startup.auth_cookie_value, startup.secure_cookies);
    Ok((jar.add(cookie), Json(AuthOkBody { ok: true })))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<AuthOkBody>) {
    let cookie = logout_cookie(state.config.startup.secure_cookies);
    (jar.add(cookie), Json(AuthOkBody { ok: true }))
}

pub async fn me(State(state): State<AppState>, jar: CookieJar) -> Json<AuthStatusBody> {
    let authenticated = validate_cookie(&jar, &state.config.startup).is_ok();
    Json(AuthStatusBody { authenticated })
}
