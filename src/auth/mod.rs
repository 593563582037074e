//! Authentication system
//!
//! Shared-secret login and cookie validation.

pub mod credentials;
pub mod validator;

pub use credentials::{login_cookie, logout_cookie};
pub use validator::{validate_cookie, validate_password};
