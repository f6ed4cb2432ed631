//! Gatehouse Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebError, WebResult};
use axum::serve;
use gatehouse_core::GatehouseConfig;
use std::time::Duration;
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{error, info, warn};

/// Main Gatehouse web server
pub struct GatehouseServer {
    config: GatehouseConfig,
    state: AppState,
}

impl GatehouseServer {
    /// Create a new server backed by the configured database
    pub async fn new(config: GatehouseConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Start the web server and run until Ctrl-C
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("🚀 Starting Gatehouse Web Server");
        info!("📍 Server address: http://{}", address);

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("✅ Server listening on http://{}", address);

        let purge_task = self.spawn_purge_task();

        let result = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(task) = purge_task {
            task.abort();
        }

        if let Err(e) = result {
            error!("❌ Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server stopped");
        Ok(())
    }

    /// Sweep idle sessions periodically; nothing to do without an idle timeout
    fn spawn_purge_task(&self) -> Option<JoinHandle<()>> {
        self.config.session.idle_timeout_secs?;

        let sessions = self.state.sessions.clone();
        let period = Duration::from_secs(self.config.session.purge_interval_secs);
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = sessions.purge_expired().await {
                    warn!("Session purge failed: {}", e);
                }
            }
        }))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for GatehouseServer
pub struct GatehouseServerBuilder {
    config: GatehouseConfig,
}

impl GatehouseServerBuilder {
    pub fn new() -> Self {
        Self::from_config(GatehouseConfig::default())
    }

    pub fn from_config(config: GatehouseConfig) -> Self {
        Self { config }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set database URL
    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database.url = database_url.into();
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<GatehouseServer> {
        self.config.validate()?;
        GatehouseServer::new(self.config).await
    }
}

impl Default for GatehouseServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_creation_in_memory() {
        let server = GatehouseServerBuilder::new()
            .database_url("sqlite::memory:")
            .build()
            .await;
        assert!(server.is_ok());
    }

    #[tokio::test]
    async fn test_builder_rejects_invalid_config() {
        let server = GatehouseServerBuilder::new().port(0).build().await;
        assert!(matches!(server, Err(WebError::Core(_))));
    }

    #[test]
    fn test_server_builder() {
        let builder = GatehouseServerBuilder::new()
            .host("localhost")
            .port(3000)
            .database_url("sqlite://test.db");

        assert_eq!(builder.config.server.host, "localhost");
        assert_eq!(builder.config.server.port, 3000);
        assert_eq!(builder.config.database.url, "sqlite://test.db");
    }
}
