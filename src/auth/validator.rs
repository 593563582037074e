//! Authentication validator
//!
//! A single shared secret: the login endpoint checks a password and hands
//! out a cookie, every protected request must present that cookie.

use axum_extra::extract::CookieJar;

use crate::config::{AUTH_COOKIE_NAME, StartupConfig};
use crate::error::AuthError;

/// Performs basic input sanitation to check for malformed passwords.
fn is_valid_input(input: &str) -> bool {
    !input.is_empty() && input.len() <= 512 && !input.contains(['\r', '\n', '\0'])
}

/// Validates a login password against the configured one
pub fn validate_password(password: &str, config: &StartupConfig) -> Result<(), AuthError> {
    let expected = config
        .app_password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(AuthError::PasswordNotConfigured)?;

    if !is_valid_input(password) {
        return Err(AuthError::InvalidPassword);
    }

    if password == expected {
        Ok(())
    } else {
        Err(AuthError::InvalidPassword)
    }
}

/// Checks the request's auth cookie against the configured value
pub fn validate_cookie(jar: &CookieJar, config: &StartupConfig) -> Result<(), AuthError> {
    if !config.auth_enabled {
        return Ok(());
    }

    match jar.get(AUTH_COOKIE_NAME) {
        Some(cookie) if cookie.value() == config.auth_cookie_value => Ok(()),
        _ => Err(AuthError::NotAuthenticated),
    }
}
