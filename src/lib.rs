pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod server;
pub mod storage;
pub mod upload;

pub use http::{AppState, build_router};
pub use server::Server;
