//! Server core functionality
//!
//! Startup, listener binding and the serve loop.

pub mod core;

pub use core::Server;
