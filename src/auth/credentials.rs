//! Auth cookie construction
//!
//! Builds the cookies set on login and logout. Parsing of incoming cookies
//! is left to [`CookieJar`](axum_extra::extract::CookieJar), which also
//! percent-decodes values.

use axum_extra::extract::cookie::{Cookie, SameSite};
use cookie::time::Duration;

use crate::config::AUTH_COOKIE_NAME;

/// Cookie lifetime after login: one week
pub const COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;

/// Cookie that logs the browser in
pub fn login_cookie(value: &str, secure: bool) -> Cookie<'static> {
    build_cookie(value.to_string(), Duration::seconds(COOKIE_MAX_AGE_SECS), secure)
}

/// Expired cookie that clears the login
pub fn logout_cookie(secure: bool) -> Cookie<'static> {
    build_cookie(String::new(), Duration::ZERO, secure)
}

fn build_cookie(value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_cookie_attributes() {
        let cookie = login_cookie("ok", false);
        assert_eq!(cookie.name(), "cloud_auth");
        assert_eq!(cookie.value(), "ok");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(604800)));

        let rendered = cookie.to_string();
        assert!(rendered.starts_with("cloud_auth=ok;"));
        assert!(rendered.contains("Max-Age=604800"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn logout_cookie_expires_immediately() {
        let cookie = logout_cookie(true);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.secure(), Some(true));
        assert!(cookie.to_string().contains("Max-Age=0"));
    }
}
