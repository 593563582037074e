//! Cloud Files Server - Entry Point
//!
//! A self-hosted file browser backend: directory listing, uploads with image
//! re-encoding, and a shared-secret login.

use log::{error, info};
use std::process;

use cloud_files_server::config::ServerConfig;
use cloud_files_server::error::ServerError;
use cloud_files_server::server::Server;

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default filter
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Launching cloud files server...");

    if let Err(e) = run().await {
        error!("Server stopped: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;
    let server = Server::new(config).await?;
    server.start().await
}
