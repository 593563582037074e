//! Server middleware
//!
//! Request logging and the auth cookie gate.

pub mod auth;
pub mod logging;

pub use auth::require_auth;
pub use logging::log_requests;
