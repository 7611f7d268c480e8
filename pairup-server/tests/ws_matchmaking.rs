//! WebSocket matchmaking integration tests
//!
//! These tests drive a real server over tokio-tungstenite:
//! - Registration, queueing and pairing
//! - Skip, leave and message relay within a session
//! - Disconnect grace period and reconnect restore

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::client::{TestClient, WsConnection};
use pairup_core::{Coordinator, CoordinatorConfig, MemoryModeration, MemoryProfiles, MemoryQuota};
use pairup_server::{AppState, PairupServer, ServerConfig};
use serde_json::json;
use tokio::net::TcpListener;

fn short_grace() -> CoordinatorConfig {
    CoordinatorConfig {
        grace_period_secs: 1,
        ..Default::default()
    }
}

async fn paired(addr: std::net::SocketAddr) -> (TestClient, TestClient, String) {
    let mut a = TestClient::connect(addr, "alice").await;
    let mut b = TestClient::connect(addr, "bob").await;
    assert_eq!(a.join_queue().await, 1);
    assert_eq!(b.join_queue().await, 2);
    let session_a = a.expect_paired().await;
    let session_b = b.expect_paired().await;
    assert_eq!(session_a, session_b);
    (a, b, session_a)
}

#[tokio::test]
async fn register_is_confirmed() {
    let (state, addr) = common::create_test_server().await;
    let _client = TestClient::connect(addr, "alice").await;

    assert!(state.coordinator.is_registered("alice").await);
}

#[tokio::test]
async fn two_clients_are_paired() {
    let (state, addr) = common::create_test_server().await;
    let (_a, _b, session_id) = paired(addr).await;

    let session = state.coordinator.session_of("alice").await.unwrap();
    assert_eq!(session.id(), session_id);
    assert_eq!(state.coordinator.queue_len().await, 0);
}

#[tokio::test]
async fn paired_message_lists_both_participants() {
    let (_state, addr) = common::create_test_server().await;
    let mut a = TestClient::connect(addr, "alice").await;
    let mut b = TestClient::connect(addr, "bob").await;
    a.join_queue().await;
    b.join_queue().await;

    let msg = a.expect("session_paired").await;
    let participants = msg["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 2);
    assert_eq!(participants[0]["identifier"], "alice");
    assert_eq!(participants[1]["identifier"], "bob");
    assert_eq!(msg["restored"], false);
    b.expect_paired().await;
}

#[tokio::test]
async fn skip_notifies_partner_and_requeues_both() {
    let (_state, addr) = common::create_test_server().await;
    let (mut a, mut b, session_id) = paired(addr).await;

    a.send(json!({ "type": "skip_partner", "session_id": session_id, "reason": "skip" }))
        .await;

    let ended = b.expect("partner_ended").await;
    assert_eq!(ended["session_id"], session_id.as_str());
    assert_eq!(ended["reason"], "skip");
    assert_eq!(ended["should_requeue"], true);
    assert_eq!(ended["by_identifier"], "alice");

    // Both went back into the queue and were paired again
    let next_b = b.expect_paired().await;
    let next_a = a.expect_paired().await;
    assert_eq!(next_a, next_b);
    assert_ne!(next_a, session_id);
}

#[tokio::test]
async fn skip_with_exit_requeues_nobody() {
    let (state, addr) = common::create_test_server().await;
    let (mut a, mut b, session_id) = paired(addr).await;

    a.send(json!({ "type": "skip_partner", "session_id": session_id, "reason": "exit" }))
        .await;

    let ended = b.expect("partner_ended").await;
    assert_eq!(ended["should_requeue"], false);
    b.expect_none_of("queue_joined", Duration::from_millis(200))
        .await;
    assert_eq!(state.coordinator.queue_len().await, 0);
    assert_eq!(state.coordinator.session_count().await, 0);
}

#[tokio::test]
async fn leave_session_requeues_partner() {
    let (state, addr) = common::create_test_server().await;
    let (mut a, mut b, session_id) = paired(addr).await;

    a.send(json!({ "type": "leave_session", "session_id": session_id }))
        .await;

    let ended = b.expect("partner_ended").await;
    assert_eq!(ended["reason"], "leave");
    let queued = b.expect("queue_joined").await;
    assert_eq!(queued["position"], 1);
    assert!(!state.coordinator.is_queued("alice").await);
}

#[tokio::test]
async fn messages_reach_both_members() {
    let (_state, addr) = common::create_test_server().await;
    let (mut a, mut b, session_id) = paired(addr).await;

    a.send(json!({
        "type": "send_message",
        "session_id": session_id,
        "message": "hello there",
    }))
    .await;

    for client in [&mut a, &mut b] {
        let msg = client.expect("new_message").await;
        assert_eq!(msg["message"], "hello there");
        assert_eq!(msg["identifier"], "alice");
        assert_eq!(msg["session_id"], session_id.as_str());
        assert!(msg["id"].as_str().is_some());
    }
}

#[tokio::test]
async fn reactions_reach_both_members() {
    let (_state, addr) = common::create_test_server().await;
    let (mut a, mut b, session_id) = paired(addr).await;

    b.send(json!({
        "type": "add_reaction",
        "session_id": session_id,
        "message_id": "m1",
        "emoji": "👍",
    }))
    .await;

    for client in [&mut a, &mut b] {
        let msg = client.expect("message_reaction").await;
        assert_eq!(msg["message_id"], "m1");
        assert_eq!(msg["identifier"], "bob");
    }
}

#[tokio::test]
async fn heartbeat_is_acknowledged() {
    let (_state, addr) = common::create_test_server().await;
    let mut client = TestClient::connect(addr, "alice").await;

    client.send(json!({ "type": "heartbeat" })).await;

    client.expect("heartbeat_ack").await;
}

#[tokio::test]
async fn invalid_message_returns_error() {
    let (_state, addr) = common::create_test_server().await;
    let mut conn = WsConnection::connect(addr).await;

    conn.send_raw("not json").await;

    let msg: serde_json::Value = conn.recv_json().await;
    assert_eq!(msg["type"], "error");
    assert_eq!(msg["code"], "invalid_message");
}

#[tokio::test]
async fn join_before_register_is_refused() {
    let (_state, addr) = common::create_test_server().await;
    let mut conn = WsConnection::connect(addr).await;

    conn.send_json(&json!({ "type": "join_queue" })).await;

    let msg: serde_json::Value = conn.recv_json().await;
    assert_eq!(msg["type"], "error");
    assert_eq!(msg["code"], "not_registered");
}

#[tokio::test]
async fn banned_client_gets_match_error() {
    let moderation = Arc::new(MemoryModeration::new());
    moderation.ban("alice", None, Some("abuse".to_string())).await;
    let coordinator = Arc::new(Coordinator::new(
        CoordinatorConfig::default(),
        moderation,
        Arc::new(MemoryQuota::unlimited()),
        Arc::new(MemoryProfiles::new()),
    ));
    let state = Arc::new(AppState::with_components(coordinator));
    let server = PairupServer::with_state(ServerConfig::new("127.0.0.1", 0), state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(server.run_with_listener(listener));

    let mut client = TestClient::connect(addr, "alice").await;
    client.send(json!({ "type": "join_queue" })).await;

    let msg = client.expect("match_error").await;
    assert_eq!(msg["code"], "banned");
    assert_eq!(msg["reason"], "abuse");
    assert!(!state.coordinator.is_queued("alice").await);
}

#[tokio::test]
async fn check_active_session_reports_stale() {
    let (_state, addr) = common::create_test_server().await;
    let mut client = TestClient::connect(addr, "alice").await;

    client
        .send(json!({ "type": "check_active_session", "session_id": "nope" }))
        .await;

    let msg = client.expect("partner_ended").await;
    assert_eq!(msg["reason"], "stale");
    assert_eq!(msg["should_requeue"], false);
}

#[tokio::test]
async fn dropped_client_gets_grace_then_partner_requeued() {
    let (state, addr) = common::create_test_server_with_config(short_grace()).await;
    let (a, mut b, session_id) = paired(addr).await;

    a.conn.close().await;

    let status = b.expect("partner_status").await;
    assert_eq!(status["status"], "reconnecting");
    assert_eq!(status["session_id"], session_id.as_str());

    let ended = b.expect("partner_ended").await;
    assert_eq!(ended["reason"], "disconnect");
    assert_eq!(ended["should_requeue"], true);
    let queued = b.expect("queue_joined").await;
    assert_eq!(queued["position"], 1);
    assert!(state.coordinator.session_of("bob").await.is_none());
}

#[tokio::test]
async fn reconnect_within_grace_restores_session() {
    let (_state, addr) = common::create_test_server_with_config(CoordinatorConfig {
        grace_period_secs: 3,
        ..Default::default()
    })
    .await;
    let (a, mut b, session_id) = paired(addr).await;

    a.conn.close().await;
    b.expect("partner_status").await;

    let mut a2 = TestClient::connect(addr, "alice").await;
    let restored = a2.expect("session_paired").await;
    assert_eq!(restored["restored"], true);
    assert_eq!(restored["session_id"], session_id.as_str());

    let online = b.expect("partner_status").await;
    assert_eq!(online["status"], "online");
    b.expect_none_of("partner_ended", Duration::from_secs(4))
        .await;
}

#[tokio::test]
async fn page_unload_ends_session_immediately() {
    let (_state, addr) = common::create_test_server().await;
    let (mut a, mut b, _session_id) = paired(addr).await;

    a.send(json!({ "type": "page_unload" })).await;
    // Round-trip so the unload is processed before the close
    a.send(json!({ "type": "heartbeat" })).await;
    a.expect("heartbeat_ack").await;
    a.conn.close().await;

    let ended = tokio::time::timeout(Duration::from_secs(2), b.expect("partner_ended"))
        .await
        .expect("partner_ended should not wait for the grace period");
    assert_eq!(ended["reason"], "disconnect");
}

#[tokio::test]
async fn second_tab_supersedes_first() {
    let (state, addr) = common::create_test_server().await;
    let (mut a, mut b, _session_id) = paired(addr).await;

    let _a2 = TestClient::connect(addr, "alice").await;

    assert!(a.closed_within(Duration::from_secs(2)).await);
    let ended = b.expect("partner_ended").await;
    assert_eq!(ended["reason"], "leave");
    assert!(state.coordinator.is_registered("alice").await);
}
