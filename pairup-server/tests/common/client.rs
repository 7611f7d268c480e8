//! WebSocket test client for protocol testing
//!
//! Provides both low-level WsConnection and high-level TestClient.
//!
//! Note: Some methods may appear unused because they're only used in specific
//! test files and clippy checks each test independently.

use std::net::SocketAddr;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Serialize, de::DeserializeOwned};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default wait for an expected message
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Low-level WebSocket connection
pub struct WsConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WsConnection {
    /// Connect to WebSocket endpoint
    pub async fn connect(addr: SocketAddr) -> Self {
        let url = format!("ws://{}/ws", addr);
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("Failed to connect");
        let (sink, stream) = ws.split();
        Self { sink, stream }
    }

    /// Send raw text message
    pub async fn send_raw(&mut self, msg: &str) {
        self.sink
            .send(Message::Text(msg.to_string().into()))
            .await
            .unwrap();
    }

    /// Send JSON message
    pub async fn send_json<T: Serialize>(&mut self, msg: &T) {
        let json = serde_json::to_string(msg).unwrap();
        self.send_raw(&json).await;
    }

    /// Receive raw text message; None once the server closed the socket
    pub async fn recv_raw(&mut self) -> Option<String> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(text.to_string()),
                Some(Ok(Message::Close(_))) | None => return None,
                Some(Ok(_)) => continue,
                Some(Err(_)) => return None,
            }
        }
    }

    /// Receive and deserialize JSON message
    pub async fn recv_json<T: DeserializeOwned>(&mut self) -> T {
        let text = tokio::time::timeout(RECV_TIMEOUT, self.recv_raw())
            .await
            .expect("Timed out waiting for message")
            .expect("WebSocket closed");
        serde_json::from_str(&text).expect("Failed to parse JSON")
    }

    /// Receive with timeout, returns None if timeout or closed
    pub async fn recv_timeout(&mut self, duration: Duration) -> Option<String> {
        tokio::time::timeout(duration, self.recv_raw())
            .await
            .ok()
            .flatten()
    }

    /// Close the socket from the client side
    pub async fn close(mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
    }
}

/// High-level test client with helper methods
pub struct TestClient {
    pub conn: WsConnection,
    pub identifier: String,
}

impl TestClient {
    /// Connect and register, consuming the registration_confirmed reply
    #[allow(dead_code)]
    pub async fn connect(addr: SocketAddr, identifier: &str) -> Self {
        let mut conn = WsConnection::connect(addr).await;
        conn.send_json(&serde_json::json!({
            "type": "register",
            "identifier": identifier,
        }))
        .await;

        let confirmed: serde_json::Value = conn.recv_json().await;
        assert_eq!(
            confirmed["type"], "registration_confirmed",
            "Expected registration_confirmed but got: {}",
            confirmed
        );
        assert_eq!(confirmed["identifier"], identifier);

        Self {
            conn,
            identifier: identifier.to_string(),
        }
    }

    /// Send a type-tagged message with extra fields
    #[allow(dead_code)]
    pub async fn send(&mut self, msg: serde_json::Value) {
        self.conn.send_json(&msg).await;
    }

    /// Join the queue, returns the reported position
    #[allow(dead_code)]
    pub async fn join_queue(&mut self) -> u64 {
        self.send(serde_json::json!({ "type": "join_queue" })).await;
        let msg = self.expect("queue_joined").await;
        msg["position"].as_u64().unwrap()
    }

    /// Receive next message
    #[allow(dead_code)]
    pub async fn recv(&mut self) -> serde_json::Value {
        self.conn.recv_json().await
    }

    /// Skip messages until one of the given type arrives
    #[allow(dead_code)]
    pub async fn expect(&mut self, msg_type: &str) -> serde_json::Value {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let text = self
                .conn
                .recv_timeout(remaining)
                .await
                .unwrap_or_else(|| panic!("Timed out waiting for {}", msg_type));
            let msg: serde_json::Value = serde_json::from_str(&text).unwrap();
            if msg["type"] == msg_type {
                return msg;
            }
        }
    }

    /// Wait until paired, returns the session ID
    #[allow(dead_code)]
    pub async fn expect_paired(&mut self) -> String {
        let msg = self.expect("session_paired").await;
        msg["session_id"].as_str().unwrap().to_string()
    }

    /// Assert no message of the given type arrives within duration
    #[allow(dead_code)]
    pub async fn expect_none_of(&mut self, msg_type: &str, duration: Duration) {
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return;
            }
            let Some(text) = self.conn.recv_timeout(remaining).await else {
                return;
            };
            let msg: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_ne!(msg["type"], msg_type, "Unexpected message: {}", msg);
        }
    }

    /// Whether the server closed this socket within duration
    #[allow(dead_code)]
    pub async fn closed_within(&mut self, duration: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, self.conn.recv_raw()).await {
                Ok(None) => return true,
                Ok(Some(_)) => continue,
                Err(_) => return false,
            }
        }
    }
}
