//! Notice type definitions

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::participant::{Identifier, Participant, SessionId};

/// Why a session ended for the remaining party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Partner asked for someone new
    Skip,
    /// Partner left the chat entirely
    Exit,
    /// Partner left the session without skipping
    Leave,
    /// Partner dropped and did not come back in time
    Disconnect,
    /// The session was already gone when the client checked
    Stale,
}

impl EndReason {
    /// Whether the remaining party goes back into the queue
    pub fn requeues_partner(&self) -> bool {
        !matches!(self, Self::Exit | Self::Stale)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Exit => "exit",
            Self::Leave => "leave",
            Self::Disconnect => "disconnect",
            Self::Stale => "stale",
        }
    }
}

/// Live status of the other party in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerStatus {
    Reconnecting,
    Online,
}

/// A chat message relayed between the two members of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: SessionId,
    pub message: String,
    pub identifier: Identifier,
    pub display_name: String,
    /// Milliseconds since UNIX epoch
    pub timestamp: i64,
    pub reply_to: Option<String>,
}

/// Notifications the coordinator delivers to a single connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    /// The connection is now the current one for this identifier
    RegistrationConfirmed { identifier: Identifier },

    /// Entered the wait queue at a 1-based position
    QueueJoined { position: usize },

    /// Paired with a partner, or restored into an existing session
    SessionPaired {
        session_id: SessionId,
        participants: Vec<Participant>,
        restored: bool,
    },

    /// Partner dropped or came back
    PartnerStatus {
        session_id: SessionId,
        status: PartnerStatus,
    },

    /// Session is over for the receiving party
    PartnerEnded {
        session_id: SessionId,
        reason: EndReason,
        should_requeue: bool,
        by_identifier: Identifier,
    },

    /// Join refused
    MatchError {
        code: String,
        message: String,
        banned_until: Option<String>,
        reason: Option<String>,
    },

    /// Chat message relayed within a session
    NewMessage(ChatMessage),

    /// Reaction relayed within a session
    MessageReaction {
        session_id: SessionId,
        message_id: String,
        emoji: String,
        identifier: Identifier,
    },

    /// Reply to a client heartbeat
    HeartbeatAck,
}

impl Notice {
    /// Build the refusal notice for a failed join
    pub fn match_error(error: &MatchError) -> Self {
        let (banned_until, reason) = match error {
            MatchError::Banned { until, reason } => {
                (until.map(|u| u.to_rfc3339()), reason.clone())
            }
            _ => (None, None),
        };
        Notice::MatchError {
            code: error.code().to_string(),
            message: error.to_string(),
            banned_until,
            reason,
        }
    }

    /// Session this notice is about, if any
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Notice::SessionPaired { session_id, .. }
            | Notice::PartnerStatus { session_id, .. }
            | Notice::PartnerEnded { session_id, .. }
            | Notice::MessageReaction { session_id, .. } => Some(session_id),
            Notice::NewMessage(message) => Some(&message.session_id),
            Notice::RegistrationConfirmed { .. }
            | Notice::QueueJoined { .. }
            | Notice::MatchError { .. }
            | Notice::HeartbeatAck => None,
        }
    }
}
