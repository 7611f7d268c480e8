//! WebSocket connection handling

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use pairup_core::{Connection, Identifier, MatchError, Notice};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::{AppState, ServerError};

use super::protocol::{ClientMessage, ErrorMessage, ServerMessage};

/// Coordinator-facing handle for one WebSocket
///
/// Notices are queued on an unbounded channel drained by the socket's writer
/// task, so `send` never blocks the coordinator.
pub struct WsConnection {
    id: String,
    tx: mpsc::UnboundedSender<ServerMessage>,
    connected: AtomicBool,
    closed: CancellationToken,
}

impl WsConnection {
    fn new(tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tx,
            connected: AtomicBool::new(true),
            closed: CancellationToken::new(),
        }
    }

    fn send_error(&self, error: &ServerError) {
        let reply = ServerMessage::Error(ErrorMessage::new(error.to_string(), error.code()));
        if self.tx.send(reply).is_err() {
            trace!(connection = %self.id, "Dropped error reply, writer gone");
        }
    }

    fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.closed.cancel();
    }
}

impl Connection for WsConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.tx.is_closed()
    }

    fn send(&self, notice: Notice) -> Result<(), MatchError> {
        if !self.is_connected() {
            return Err(MatchError::TransportGone(self.id.clone()));
        }
        self.tx
            .send(ServerMessage::Notice(notice))
            .map_err(|_| MatchError::TransportGone(self.id.clone()))
    }

    fn close(&self) {
        debug!(connection = %self.id, "Closing superseded connection");
        self.mark_disconnected();
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let conn = Arc::new(WsConnection::new(tx));

    info!(connection = %conn.id(), "WebSocket client connected");

    let writer = {
        let closed = conn.closed.clone();
        let connection_id = conn.id().to_string();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = closed.cancelled() => break,
                    msg = rx.recv() => {
                        let Some(msg) = msg else { break };
                        let json = match serde_json::to_string(&msg) {
                            Ok(json) => json,
                            Err(e) => {
                                error!(connection = %connection_id, "Failed to serialize message: {}", e);
                                continue;
                            }
                        };
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
            }
            let _ = sender.send(Message::Close(None)).await;
        })
    };

    let mut bound: Option<Identifier> = None;

    loop {
        let msg = tokio::select! {
            _ = conn.closed.cancelled() => break,
            msg = receiver.next() => msg,
        };

        match msg {
            Some(Ok(Message::Text(text))) => {
                if let Err(e) = handle_text_message(&text, &state, &conn, &mut bound).await {
                    warn!(connection = %conn.id(), code = e.code(), "Error handling message: {}", e);
                    conn.send_error(&e);
                }
            }
            Some(Ok(Message::Close(_))) => {
                debug!(connection = %conn.id(), "WebSocket client sent close frame");
                break;
            }
            Some(Ok(_)) => {
                // Ping/pong are answered by the transport; binary is ignored
            }
            Some(Err(e)) => {
                warn!(connection = %conn.id(), "WebSocket error: {}", e);
                break;
            }
            None => break,
        }
    }

    conn.mark_disconnected();
    if let Some(identifier) = bound {
        state.coordinator.disconnect(&identifier, conn.id()).await;
    }
    if let Err(e) = writer.await {
        debug!(connection = %conn.id(), "Writer task ended abnormally: {}", e);
    }

    info!(connection = %conn.id(), "WebSocket client disconnected");
}

/// Handle a text message from the client
async fn handle_text_message(
    text: &str,
    state: &Arc<AppState>,
    conn: &Arc<WsConnection>,
    bound: &mut Option<Identifier>,
) -> Result<(), ServerError> {
    let client_msg: ClientMessage =
        serde_json::from_str(text).map_err(|e| ServerError::InvalidMessage(e.to_string()))?;
    let coordinator = &state.coordinator;

    match client_msg {
        ClientMessage::Register { identifier } => {
            if identifier.is_empty() {
                return Err(ServerError::InvalidMessage("empty identifier".to_string()));
            }
            if let Some(previous) = bound.take() {
                if previous != identifier {
                    debug!(connection = %conn.id(), from = %previous, to = %identifier, "Socket re-registered");
                    coordinator.disconnect(&previous, conn.id()).await;
                }
            }
            let handle: Arc<dyn Connection> = conn.clone();
            coordinator.register(&identifier, handle).await;
            *bound = Some(identifier);
            return Ok(());
        }
        ClientMessage::Heartbeat => {
            conn.send(Notice::HeartbeatAck)?;
            return Ok(());
        }
        _ => {}
    }

    let Some(identifier) = bound.clone() else {
        return Err(MatchError::NotRegistered(conn.id().to_string()).into());
    };

    match client_msg {
        ClientMessage::JoinQueue => match coordinator.join(&identifier).await {
            Ok(Some(position)) => debug!(identifier = %identifier, position, "Joined queue"),
            Ok(None) => debug!(identifier = %identifier, "Paired before reaching the queue"),
            // Already reported to the client as match_error
            Err(MatchError::Banned { .. } | MatchError::QuotaExhausted) => {}
            Err(e) => return Err(e.into()),
        },

        ClientMessage::LeaveQueue => {
            coordinator.leave_queue(&identifier).await;
        }

        ClientMessage::SkipPartner { session_id, reason } => {
            ignore_stale(coordinator.skip(&identifier, &session_id, reason).await)?;
        }

        ClientMessage::LeaveSession { session_id } => {
            ignore_stale(coordinator.leave_session(&identifier, &session_id).await)?;
        }

        ClientMessage::SendMessage {
            session_id,
            message,
            reply_to,
        } => {
            let result = coordinator
                .send_message(&identifier, &session_id, message, reply_to)
                .await
                .map(|_| ());
            ignore_stale(result)?;
        }

        ClientMessage::AddReaction {
            session_id,
            message_id,
            emoji,
        } => {
            let result = coordinator
                .add_reaction(&identifier, &session_id, &message_id, &emoji)
                .await;
            ignore_stale(result)?;
        }

        ClientMessage::PageUnload => coordinator.page_unload(&identifier).await,

        ClientMessage::CheckActiveSession { session_id } => {
            coordinator
                .check_active_session(&identifier, &session_id)
                .await;
        }

        ClientMessage::Register { .. } | ClientMessage::Heartbeat => {}
    }

    Ok(())
}

/// Operations on a session that already ended are no-ops
fn ignore_stale(result: Result<(), MatchError>) -> Result<(), ServerError> {
    match result {
        Err(MatchError::StaleSession(session_id)) => {
            debug!(session_id = %session_id, "Ignoring request for stale session");
            Ok(())
        }
        other => other.map_err(ServerError::from),
    }
}
