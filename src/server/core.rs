use axum::Router;
use log::{error, info, warn};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::{AppState, build_router};

pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    /// Prepares the store and staging directories and binds the listen socket.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let socket = config.startup.listen_socket();
        let state = AppState::new(config)?;
        info!(
            "Store root: {}, staging: {}",
            state.tree.root().display(),
            state.staging.dir().display()
        );
        if state.config.startup.auth_enabled && state.config.startup.app_password.is_none() {
            warn!("Auth is enabled but no app password is configured; login will fail");
        }

        let router = build_router(state);

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e.into());
            }
        };

        Ok(Self { listener, router })
    }

    pub async fn start(self) -> Result<(), ServerError> {
        let addr = self.listener.local_addr()?;
        info!("Starting cloud files server on {}", addr);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
