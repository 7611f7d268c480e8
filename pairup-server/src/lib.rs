//! pairup-server - HTTP and WebSocket server for the pairup matchmaker
//!
//! This crate owns the shared [`Coordinator`](pairup_core::Coordinator) and
//! exposes it to browser clients over a single WebSocket endpoint, plus a
//! couple of read-only HTTP routes.

mod error;
pub mod http;
mod state;
pub mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use pairup_core::CoordinatorConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;

/// The main pairup server
pub struct PairupServer {
    config: ServerConfig,
    state: Arc<AppState>,
    shutdown: CancellationToken,
}

impl PairupServer {
    /// Create a new server with in-memory collaborators
    pub fn new(config: ServerConfig) -> Self {
        let state = Arc::new(AppState::with_config(config.coordinator.clone()));
        Self::with_state(config, state)
    }

    /// Create a server with custom state (for testing)
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self {
            config,
            state,
            shutdown: CancellationToken::new(),
        }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Token that stops the server gracefully when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("pairup server listening on {}", addr);

        self.run_with_listener(listener).await
    }

    /// Run the server on an already bound listener
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let coordinator = Arc::clone(&self.state.coordinator);
        let tasks = coordinator.spawn_background_tasks();

        let router = create_router(self.state);
        let shutdown = self.shutdown.clone();
        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ServerError::Internal(e.to_string()));

        coordinator.shutdown();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("Background task ended abnormally: {}", e);
            }
        }
        tracing::info!("pairup server stopped");

        result
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Matchmaking tunables
    pub coordinator: CoordinatorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7433,
            coordinator: CoordinatorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            coordinator: CoordinatorConfig::default(),
        }
    }

    /// Replace the coordinator tunables
    #[must_use]
    pub fn with_coordinator(mut self, coordinator: CoordinatorConfig) -> Self {
        self.coordinator = coordinator;
        self
    }

    /// Returns the socket address string (e.g., "0.0.0.0:7433")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 7433);
        assert_eq!(config.coordinator, CoordinatorConfig::default());
    }

    #[test]
    fn test_server_config_addr() {
        let config = ServerConfig::new("127.0.0.1", 8080);
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_pairup_server_new_uses_coordinator_config() {
        let config = ServerConfig::default().with_coordinator(CoordinatorConfig {
            grace_period_secs: 4,
            ..Default::default()
        });
        let server = PairupServer::new(config);
        assert_eq!(server.state().coordinator.config().grace_period_secs, 4);
    }

    #[test]
    fn test_pairup_server_with_state() {
        let config = ServerConfig::new("127.0.0.1", 9000);
        let state = Arc::new(AppState::new());
        let server = PairupServer::with_state(config.clone(), state);
        assert_eq!(server.config().port, 9000);
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = PairupServer::new(ServerConfig::default());
        let token = server.shutdown_token();

        let handle = tokio::spawn(server.run_with_listener(listener));
        token.cancel();

        assert!(handle.await.unwrap().is_ok());
    }
}
