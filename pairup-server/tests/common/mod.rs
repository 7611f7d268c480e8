//! Shared test utilities for pairup-server integration tests

pub mod client;

use std::net::SocketAddr;
use std::sync::Arc;

use pairup_core::CoordinatorConfig;
use pairup_server::{AppState, PairupServer, ServerConfig};
use tokio::net::TcpListener;

/// Creates a test server with default config, returns state and address
#[allow(dead_code)]
pub async fn create_test_server() -> (Arc<AppState>, SocketAddr) {
    create_test_server_with_config(CoordinatorConfig::default()).await
}

/// Creates a test server with custom coordinator tunables
#[allow(dead_code)]
pub async fn create_test_server_with_config(
    coordinator: CoordinatorConfig,
) -> (Arc<AppState>, SocketAddr) {
    let state = Arc::new(AppState::with_config(coordinator.clone()));
    let config = ServerConfig::new("127.0.0.1", 0).with_coordinator(coordinator);

    let server = PairupServer::with_state(config, Arc::clone(&state));
    let addr = spawn_server(server).await;

    (state, addr)
}

/// Spawns server in background task, returns bound address
async fn spawn_server(server: PairupServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    addr
}
