//! REST API handlers

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Identifiers waiting to be paired
    pub queue_length: usize,
    /// Number of active sessions
    pub active_sessions: usize,
    /// Registered connections
    pub connections: usize,
}

/// Health check endpoint
///
/// Returns server status, version, uptime, queue length and active session count.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let coordinator = &state.coordinator;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        queue_length: coordinator.queue_len().await,
        active_sessions: coordinator.session_count().await,
        connections: coordinator.connection_count().await,
    })
}

/// One waiting identifier in the stats view
#[derive(Debug, Serialize, Deserialize)]
pub struct QueueSlot {
    /// 1-based position
    pub position: usize,
    pub identifier: String,
    pub display_name: String,
    /// Seconds spent waiting so far
    pub waiting_seconds: i64,
}

/// Queue snapshot response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub queue: Vec<QueueSlot>,
    pub active_sessions: usize,
}

/// GET /api/stats - Queue snapshot and session count
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let now = Utc::now();
    let queue = state
        .coordinator
        .queue_snapshot()
        .await
        .into_iter()
        .enumerate()
        .map(|(index, entry)| QueueSlot {
            position: index + 1,
            waiting_seconds: (now - entry.enqueued_at).num_seconds(),
            identifier: entry.identifier,
            display_name: entry.display_name,
        })
        .collect();

    Json(StatsResponse {
        queue,
        active_sessions: state.coordinator.session_count().await,
    })
}
